use std::env;

use tracing::{debug, instrument};

use crate::errors::IngestError;

use super::detect::{file_suffix, Detection, SourceFormat};
use super::flatten::flatten;
use super::handlers::{default_handlers, FormatHandler};
use super::types::{RenderedContent, SourcePayload, UnsupportedFormat};

/// Dispatches payloads to format handlers.
///
/// Resolution runs two passes over the registered handlers: the file-name
/// suffix (case-sensitive), then magic bytes. The magic pass only runs when
/// the suffix is unknown, and a payload it claims that then fails to decode
/// is reported as unsupported. Turn it off with [`FormatReader::suffix_only`]
/// for strict suffix dispatch.
pub struct FormatReader {
    handlers: Vec<Box<dyn FormatHandler>>,
    suffix_only: bool,
}

impl Default for FormatReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatReader {
    const SUFFIX_ONLY_VARS: [&'static str; 2] = ["INSIGHT_SUFFIX_ONLY", "AIE_INSIGHT_SUFFIX_ONLY"];

    pub fn new() -> Self {
        Self {
            handlers: default_handlers(),
            suffix_only: false,
        }
    }

    pub fn from_env() -> Self {
        let suffix_only = Self::SUFFIX_ONLY_VARS
            .iter()
            .find_map(|key| env::var(key).ok())
            .is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes"));
        Self::new().suffix_only(suffix_only)
    }

    pub fn suffix_only(mut self, suffix_only: bool) -> Self {
        self.suffix_only = suffix_only;
        self
    }

    /// Handlers registered later are consulted after the built-in ones.
    #[cfg(test)]
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: FormatHandler + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn resolve(&self, payload: &SourcePayload) -> Option<(&dyn FormatHandler, Detection)> {
        if let Some(suffix) = file_suffix(&payload.name) {
            if let Some(handler) = self.handlers.iter().find(|h| h.matches_suffix(suffix)) {
                return Some((handler.as_ref(), Detection::Suffix));
            }
        }

        if self.suffix_only {
            return None;
        }

        self.handlers
            .iter()
            .find(|h| h.sniff(&payload.bytes))
            .map(|handler| (handler.as_ref(), Detection::Magic))
    }

    #[cfg(test)]
    pub fn detect(&self, payload: &SourcePayload) -> Option<SourceFormat> {
        self.resolve(payload).map(|(handler, _)| handler.format())
    }

    /// Unknown formats come back as [`RenderedContent::Unsupported`], not as an error.
    #[instrument(skip_all, fields(name = %payload.name, bytes = payload.bytes.len()))]
    pub fn render(&self, payload: &SourcePayload) -> Result<RenderedContent, IngestError> {
        let unsupported = || {
            RenderedContent::Unsupported(UnsupportedFormat {
                name: payload.name.clone(),
            })
        };

        let Some((handler, detection)) = self.resolve(payload) else {
            debug!("no handler claimed payload");
            return Ok(unsupported());
        };

        debug!(
            format = %handler.format(),
            %detection,
            digest = %payload.digest(),
            "rendering payload"
        );
        match (handler.process(payload), detection) {
            (Err(err), Detection::Magic) => {
                debug!(%err, "content sniff matched but payload did not decode");
                Ok(unsupported())
            }
            (result, _) => result,
        }
    }

    /// Renders and flattens to the text that feeds normalization. `Ok(None)`
    /// means no handler claimed the payload.
    pub fn render_text(&self, payload: &SourcePayload) -> Result<Option<String>, IngestError> {
        match self.render(payload)? {
            RenderedContent::Table(table) => flatten(&table).map(Some),
            RenderedContent::Text(text) => Ok(Some(text)),
            RenderedContent::Unsupported(_) => Ok(None),
        }
    }
}
