use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::SearchServiceError;

use super::client::{IndexName, SearchIndexClient};
use super::schema::IndexSchema;

/// In-memory index catalogue; stores the body each index was created with.
#[derive(Default)]
pub struct MockSearchClient {
    indices: Mutex<HashMap<String, Value>>,
    create_calls: AtomicUsize,
    unreachable: bool,
}

impl MockSearchClient {
    /// Every call fails as if the node were down.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Index currently stored under `name`.
    pub fn stored_body(&self, name: &str) -> Option<Value> {
        self.indices
            .lock()
            .ok()
            .and_then(|indices| indices.get(name).cloned())
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }

    fn check_reachable(&self, operation: &'static str) -> Result<(), SearchServiceError> {
        if self.unreachable {
            return Err(SearchServiceError::Unreachable {
                operation,
                reason: "mock search service is offline".to_string(),
            });
        }
        Ok(())
    }

    fn lock_poisoned(operation: &'static str) -> SearchServiceError {
        SearchServiceError::Unreachable {
            operation,
            reason: "mock search client lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl SearchIndexClient for MockSearchClient {
    async fn index_exists(&self, name: &IndexName) -> Result<bool, SearchServiceError> {
        self.check_reachable("index_exists")?;
        let indices = self
            .indices
            .lock()
            .map_err(|_| Self::lock_poisoned("index_exists"))?;
        Ok(indices.contains_key(name.as_str()))
    }

    async fn create_index(
        &self,
        name: &IndexName,
        schema: &IndexSchema,
    ) -> Result<Value, SearchServiceError> {
        self.check_reachable("create_index")?;
        self.create_calls.fetch_add(1, Ordering::Relaxed);

        let body = serde_json::to_value(schema).map_err(|err| {
            SearchServiceError::InvalidResponse {
                operation: "create_index",
                reason: err.to_string(),
            }
        })?;

        let mut indices = self
            .indices
            .lock()
            .map_err(|_| Self::lock_poisoned("create_index"))?;
        if indices.contains_key(name.as_str()) {
            return Err(SearchServiceError::AlreadyExists(name.to_string()));
        }
        indices.insert(name.to_string(), body);

        Ok(json!({
            "acknowledged": true,
            "shards_acknowledged": true,
            "index": name.as_str(),
        }))
    }
}
