use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::FetchError;

/// Body of an ad hoc API response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    Json(Value),
    Text(String),
}

impl ApiPayload {
    /// Text handed to normalization; JSON is serialized compactly.
    pub fn to_text(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Human-readable form for display.
    pub fn to_display(&self) -> String {
        match self {
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Text(text) => text.clone(),
        }
    }
}

/// Media type without parameters, lowercased (`Application/JSON; charset=utf-8` -> `application/json`).
fn media_type_essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[async_trait]
pub trait ApiFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ApiPayload, FetchError>;
}

pub type SharedApiFetcher = Arc<dyn ApiFetcher>;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub http_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            http_timeout_ms: 30_000,
        }
    }
}

impl FetchConfig {
    const TIMEOUT_VARS: [&'static str; 2] = ["API_FETCH_TIMEOUT_MS", "AIE_API_FETCH_TIMEOUT_MS"];

    pub fn from_env() -> Self {
        let http_timeout_ms = Self::TIMEOUT_VARS
            .iter()
            .find_map(|key| env::var(key).ok())
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(Self::default().http_timeout_ms);
        Self { http_timeout_ms }
    }
}

/// Plain GET; the body is JSON only when the response says `application/json`.
pub struct HttpApiFetcher {
    http: reqwest::Client,
}

impl HttpApiFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms.max(1)))
            .build()
            .context("Failed to build API fetch HTTP client")?;
        Ok(Self { http })
    }

    pub fn shared(config: &FetchConfig) -> anyhow::Result<SharedApiFetcher> {
        Ok(Arc::new(Self::new(config)?))
    }
}

#[async_trait]
impl ApiFetcher for HttpApiFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<ApiPayload, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|raw| media_type_essence(raw) == "application/json");

        let body = response.text().await.map_err(|err| FetchError::Body {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        info!(bytes = body.len(), is_json, "fetched API payload");

        if is_json {
            serde_json::from_str(&body)
                .map(ApiPayload::Json)
                .map_err(|err| FetchError::Body {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
        } else {
            Ok(ApiPayload::Text(body))
        }
    }
}
