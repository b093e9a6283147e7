//! Create, fetch, list and delete collections.

use serde_json::json;
use tracing::{error, info};

use crate::contract::{ApiRequest, ApiResponse, Transport};
use crate::error::{Error, Result};
use crate::model::{Collection, NewCollection};
use crate::registry::{decode_result, require_collection_id, COLLECTIONS_PATH};

#[derive(Debug, Clone)]
pub struct CollectionsClient<T> {
    transport: T,
}

impl<T: Transport> CollectionsClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn create(&self, collection: &NewCollection) -> Result<Collection> {
        if collection.name.trim().is_empty() {
            return Err(Error::precondition("collection name must not be empty"));
        }
        info!(name = %collection.name, "Creating collection");
        let created: Collection = self
            .transport
            .send(ApiRequest::post(COLLECTIONS_PATH, json!(collection)))
            .await
            .and_then(decode_result)
            .map_err(|e| {
                error!(name = %collection.name, error = %e, "Failed to create collection");
                e
            })?;
        info!(collection_id = %created.id, "Created collection");
        Ok(created)
    }

    pub async fn get(&self, collection_id: &str) -> Result<Collection> {
        require_collection_id(collection_id)?;
        self.transport
            .send(ApiRequest::get(format!("{COLLECTIONS_PATH}/{collection_id}")))
            .await
            .and_then(decode_result)
    }

    pub async fn list(&self) -> Result<Vec<Collection>> {
        let collections: Vec<Collection> = self
            .transport
            .send(ApiRequest::get(COLLECTIONS_PATH))
            .await
            .and_then(decode_result)?;
        info!(count = collections.len(), "Listed collections");
        Ok(collections)
    }

    pub async fn delete(&self, collection_id: &str) -> Result<()> {
        require_collection_id(collection_id)?;
        info!(collection_id, "Deleting collection");
        self.transport
            .send(ApiRequest::delete(
                format!("{COLLECTIONS_PATH}/{collection_id}"),
                None,
            ))
            .await
            .and_then(ApiResponse::error_for_status)
            .map_err(|e| {
                error!(collection_id, error = %e, "Failed to delete collection");
                e
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Method, MockTransport};

    #[tokio::test]
    async fn create_posts_name_and_model() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.path == "/api/v1/collections"
                    && req.body == Some(json!({"name": "docs", "model": "basilikum-minima"}))
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    200,
                    r#"{"result":{"id":"clt_1","name":"docs","embedding_model":"basilikum-minima"}}"#,
                ))
            });

        let created = CollectionsClient::new(transport)
            .create(&NewCollection::new("docs").with_model("basilikum-minima"))
            .await
            .unwrap();
        assert_eq!(created.id, "clt_1");
        assert_eq!(created.embedding_model.as_deref(), Some("basilikum-minima"));
    }

    #[tokio::test]
    async fn get_missing_collection_is_platform_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == Method::Get && req.path == "/api/v1/collections/nope")
            .returning(|_| {
                Ok(ApiResponse::new(
                    404,
                    r#"{"error":{"code":"not_found","message":"no such collection"}}"#,
                ))
            });

        let err = CollectionsClient::new(transport).get("nope").await.unwrap_err();
        assert_eq!(err.code(), Some("not_found"));
    }

    #[tokio::test]
    async fn delete_has_no_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Delete
                    && req.path == "/api/v1/collections/clt_1"
                    && req.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(200, "")));

        CollectionsClient::new(transport).delete("clt_1").await.unwrap();
    }
}
