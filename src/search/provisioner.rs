use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::errors::SearchServiceError;

use super::client::{IndexName, SearchIndexClient};
use super::schema::{IndexSchema, DOCUMENT_INDEX_SCHEMA};

/// Outcome of [`IndexProvisioner::ensure_index`]. An existing index is a success.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexExistence {
    Created(Value),
    AlreadyExists,
}

impl IndexExistence {
    pub const ALREADY_EXISTS_MESSAGE: &'static str = "Index already exists";

    /// Service response on create; `{"message": "Index already exists"}` otherwise.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Created(response) => response.clone(),
            Self::AlreadyExists => json!({ "message": Self::ALREADY_EXISTS_MESSAGE }),
        }
    }
}

/// Creates an index with a fixed schema unless one with the same name exists.
///
/// This is check-then-act: two callers that both see the index missing will
/// both send a create. The loser's create is rejected by the service and is
/// reported as [`IndexExistence::AlreadyExists`], so the race cannot surface
/// as an error or produce a second schema. An existing index is never
/// modified.
pub struct IndexProvisioner<'a> {
    client: &'a dyn SearchIndexClient,
    schema: &'static IndexSchema,
}

impl<'a> IndexProvisioner<'a> {
    pub fn new(client: &'a dyn SearchIndexClient) -> Self {
        Self {
            client,
            schema: &DOCUMENT_INDEX_SCHEMA,
        }
    }

    #[instrument(skip_all, fields(index = %name))]
    pub async fn ensure_index(
        &self,
        name: &IndexName,
    ) -> Result<IndexExistence, SearchServiceError> {
        if self.client.index_exists(name).await? {
            info!("index already present; leaving it untouched");
            return Ok(IndexExistence::AlreadyExists);
        }

        match self.client.create_index(name, self.schema).await {
            Ok(response) => {
                info!("index created");
                Ok(IndexExistence::Created(response))
            }
            Err(SearchServiceError::AlreadyExists(_)) => {
                info!("index appeared between existence check and create");
                Ok(IndexExistence::AlreadyExists)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::search::mock::MockSearchClient;

    fn logs() -> IndexName {
        IndexName::new("logs").expect("valid name")
    }

    #[tokio::test]
    async fn second_call_reports_existing_index() {
        let client = MockSearchClient::default();
        let provisioner = IndexProvisioner::new(&client);

        let first = provisioner.ensure_index(&logs()).await.expect("first call");
        assert!(matches!(first, IndexExistence::Created(ref body) if body["acknowledged"] == true));

        let second = provisioner.ensure_index(&logs()).await.expect("second call");
        assert_eq!(second, IndexExistence::AlreadyExists);

        assert_eq!(client.create_calls(), 1);
        let stored = client.stored_body("logs").expect("index stored");
        assert_eq!(
            stored,
            serde_json::to_value(DOCUMENT_INDEX_SCHEMA).expect("schema json")
        );
        assert_eq!(
            stored["mappings"]["properties"]
                .as_object()
                .map(|properties| properties.len()),
            Some(2)
        );
    }

    #[tokio::test]
    async fn distinct_names_are_provisioned_independently() {
        let client = MockSearchClient::default();
        let provisioner = IndexProvisioner::new(&client);

        let other = IndexName::new("metrics").expect("valid");
        assert!(matches!(
            provisioner.ensure_index(&logs()).await,
            Ok(IndexExistence::Created(_))
        ));
        assert!(matches!(
            provisioner.ensure_index(&other).await,
            Ok(IndexExistence::Created(_))
        ));
        assert_eq!(client.create_calls(), 2);
    }

    #[tokio::test]
    async fn unreachable_service_propagates() {
        let client = MockSearchClient::unreachable();
        let err = IndexProvisioner::new(&client)
            .ensure_index(&logs())
            .await
            .expect_err("offline");
        assert!(matches!(
            err,
            SearchServiceError::Unreachable {
                operation: "index_exists",
                ..
            }
        ));
        assert_eq!(client.create_calls(), 0);
    }

    /// Reports the index missing, then loses the create race.
    struct RacingClient {
        inner: MockSearchClient,
    }

    #[async_trait]
    impl SearchIndexClient for RacingClient {
        async fn index_exists(&self, _name: &IndexName) -> Result<bool, SearchServiceError> {
            Ok(false)
        }

        async fn create_index(
            &self,
            name: &IndexName,
            schema: &IndexSchema,
        ) -> Result<Value, SearchServiceError> {
            self.inner.create_index(name, schema).await
        }
    }

    #[tokio::test]
    async fn lost_create_race_is_not_an_error() {
        let racing = RacingClient {
            inner: MockSearchClient::default(),
        };
        racing
            .inner
            .create_index(&logs(), &DOCUMENT_INDEX_SCHEMA)
            .await
            .expect("competitor creates first");

        let outcome = IndexProvisioner::new(&racing)
            .ensure_index(&logs())
            .await
            .expect("race tolerated");
        assert_eq!(outcome, IndexExistence::AlreadyExists);
        assert_eq!(racing.inner.create_calls(), 2);
    }

    #[test]
    fn existing_index_renders_message_body() {
        assert_eq!(
            IndexExistence::AlreadyExists.to_json(),
            json!({"message": "Index already exists"})
        );
    }
}
