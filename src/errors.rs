use thiserror::Error;

use crate::ingest::SourceFormat;

/// Failures while turning a payload into a dataset or text.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to decode {format} payload: {reason}")]
    Decode {
        format: SourceFormat,
        reason: String,
    },
    #[error("failed to flatten table to delimited text: {0}")]
    Flatten(String),
}

impl IngestError {
    pub fn decode(format: SourceFormat, reason: impl ToString) -> Self {
        Self::Decode {
            format,
            reason: reason.to_string(),
        }
    }
}

/// Failures of the ad hoc API fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Failures talking to the search service.
#[derive(Debug, Error)]
pub enum SearchServiceError {
    #[error("search service unreachable during {operation}: {reason}")]
    Unreachable {
        operation: &'static str,
        reason: String,
    },
    #[error("search service returned status {status} during {operation}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("search service sent an unreadable response during {operation}: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },
    #[error("index '{0}' already exists")]
    AlreadyExists(String),
    #[error("invalid index name: {0}")]
    InvalidIndexName(String),
}
