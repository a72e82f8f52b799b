use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchServiceError;

use super::schema::IndexSchema;

/// Non-empty, whitespace-trimmed index name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexName(String);

impl IndexName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SearchServiceError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SearchServiceError::InvalidIndexName(
                "index name must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two index operations provisioning needs from a search service.
///
/// `create_index` should return [`SearchServiceError::AlreadyExists`] when the
/// service rejects the create because the index is already there.
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    async fn index_exists(&self, name: &IndexName) -> Result<bool, SearchServiceError>;
    async fn create_index(
        &self,
        name: &IndexName,
        schema: &IndexSchema,
    ) -> Result<Value, SearchServiceError>;
}

pub type SharedSearchClient = Arc<dyn SearchIndexClient>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_non_empty() {
        assert_eq!(IndexName::new("  logs ").expect("valid").as_str(), "logs");
        assert!(matches!(
            IndexName::new("   "),
            Err(SearchServiceError::InvalidIndexName(_))
        ));
    }
}
