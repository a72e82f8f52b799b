use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::SearchServiceError;

use super::client::{IndexName, SearchIndexClient};
use super::config::SearchConfig;
use super::schema::IndexSchema;

const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// Minimal HTTP client for the OpenSearch index REST surface.
pub struct OpenSearchClient {
    http: reqwest::Client,
    base_url: Url,
    config: SearchConfig,
}

impl OpenSearchClient {
    pub fn new(config: SearchConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.http_timeout_ms.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build OpenSearch HTTP client")?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid OpenSearch URL '{}'", config.base_url))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "OpenSearch URL '{}' cannot carry an index path",
            config.base_url
        );

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    fn index_url(&self, name: &IndexName) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name.as_str());
        }
        url
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(username) => builder.basic_auth(username, self.config.password.as_deref()),
            None => builder,
        }
    }

    async fn read_json(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<Value, SearchServiceError> {
        response
            .json::<Value>()
            .await
            .map_err(|err| SearchServiceError::InvalidResponse {
                operation,
                reason: err.to_string(),
            })
    }

    /// Error responses keep whatever text could be read; a failed read is reported in place of the body.
    fn error_body(read: Result<String, reqwest::Error>) -> String {
        match read {
            Ok(body) => body,
            Err(err) => format!("<unreadable response body: {err}>"),
        }
    }

    fn is_already_exists(body: &str) -> bool {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .pointer("/error/type")
                    .and_then(Value::as_str)
                    .map(|kind| kind == ALREADY_EXISTS_ERROR)
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl SearchIndexClient for OpenSearchClient {
    #[instrument(skip_all, fields(index = %name))]
    async fn index_exists(&self, name: &IndexName) -> Result<bool, SearchServiceError> {
        const OPERATION: &str = "index_exists";
        let response = self
            .apply_auth(self.http.head(self.index_url(name)))
            .send()
            .await
            .map_err(|err| SearchServiceError::Unreachable {
                operation: OPERATION,
                reason: err.to_string(),
            })?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchServiceError::Status {
                operation: OPERATION,
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    #[instrument(skip_all, fields(index = %name))]
    async fn create_index(
        &self,
        name: &IndexName,
        schema: &IndexSchema,
    ) -> Result<Value, SearchServiceError> {
        const OPERATION: &str = "create_index";
        let response = self
            .apply_auth(self.http.put(self.index_url(name)))
            .json(schema)
            .send()
            .await
            .map_err(|err| SearchServiceError::Unreachable {
                operation: OPERATION,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Self::read_json(OPERATION, response).await;
        }

        let body = Self::error_body(response.text().await);
        if status == StatusCode::BAD_REQUEST && Self::is_already_exists(&body) {
            debug!("create rejected because the index already exists");
            return Err(SearchServiceError::AlreadyExists(name.to_string()));
        }

        Err(SearchServiceError::Status {
            operation: OPERATION,
            status: status.as_u16(),
            body,
        })
    }
}
