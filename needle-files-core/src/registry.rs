//! # registry: file operations on a collection
//!
//! [`FileRegistry`] adds, lists and deletes the files of a collection. It holds no session
//! state: every call names its collection explicitly, so one registry can serve any number
//! of concurrent callers working on different collections. The ambient "selected collection"
//! convenience lives in [`crate::session::CollectionSession`], layered on top.
//!
//! Each operation is attempted exactly once. Preconditions (empty collection id, empty
//! file list, blank name/url) are checked before anything reaches the transport.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::contract::{ApiRequest, ApiResponse, Transport};
use crate::error::{Error, Result};
use crate::model::{CollectionFile, FileToAdd};

pub(crate) const COLLECTIONS_PATH: &str = "/api/v1/collections";

#[derive(Debug, Deserialize)]
struct ResultEnvelope<R> {
    result: R,
}

/// Check the status and unwrap `{"result": ...}` from a response.
pub(crate) fn decode_result<R: DeserializeOwned>(response: ApiResponse) -> Result<R> {
    let response = response.error_for_status()?;
    let envelope: ResultEnvelope<R> = serde_json::from_str(&response.body)?;
    Ok(envelope.result)
}

pub(crate) fn require_collection_id(collection_id: &str) -> Result<()> {
    if collection_id.trim().is_empty() {
        return Err(Error::precondition("no collection id set"));
    }
    Ok(())
}

fn files_path(collection_id: &str) -> String {
    format!("{COLLECTIONS_PATH}/{collection_id}/files")
}

/// Client for the files endpoint of a collection.
#[derive(Debug, Clone)]
pub struct FileRegistry<T> {
    transport: T,
}

impl<T: Transport> FileRegistry<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit files for indexing. Indexing runs asynchronously on the platform; the returned
    /// files usually still report `pending` or `indexing`.
    pub async fn add(&self, collection_id: &str, files: &[FileToAdd]) -> Result<Vec<CollectionFile>> {
        require_collection_id(collection_id)?;
        if files.is_empty() {
            return Err(Error::precondition("at least one file is required"));
        }
        for file in files {
            file.validate()?;
        }

        info!(collection_id, count = files.len(), "Adding files to collection");
        let request = ApiRequest::post(files_path(collection_id), json!({ "files": files }));
        let added: Vec<CollectionFile> = self
            .send(request)
            .await
            .and_then(decode_result)
            .map_err(|e| {
                error!(collection_id, error = %e, "Failed to add files");
                e
            })?;
        info!(collection_id, count = added.len(), "Files submitted for indexing");
        Ok(added)
    }

    /// Fetch a fresh snapshot of every file in the collection.
    pub async fn list(&self, collection_id: &str) -> Result<Vec<CollectionFile>> {
        require_collection_id(collection_id)?;

        let files: Vec<CollectionFile> = self
            .send(ApiRequest::get(files_path(collection_id)))
            .await
            .and_then(decode_result)
            .map_err(|e| {
                error!(collection_id, error = %e, "Failed to list files");
                e
            })?;
        info!(collection_id, count = files.len(), "Listed collection files");
        Ok(files)
    }

    /// Delete files by id. Success responses need not carry a body.
    pub async fn delete(&self, collection_id: &str, file_ids: &[String]) -> Result<()> {
        require_collection_id(collection_id)?;

        info!(collection_id, ?file_ids, "Deleting files");
        let request = ApiRequest::delete(
            files_path(collection_id),
            Some(json!({ "file_ids": file_ids })),
        );
        self.send(request)
            .await
            .and_then(ApiResponse::error_for_status)
            .map_err(|e| {
                error!(collection_id, ?file_ids, error = %e, "Failed to delete files");
                e
            })?;
        info!(collection_id, count = file_ids.len(), "Deleted files");
        Ok(())
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.transport.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Method, MockTransport};
    use crate::error::ErrorKind;
    use crate::model::FileStatus;

    #[tokio::test]
    async fn add_posts_files_and_decodes_result() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.path == "/api/v1/collections/c1/files"
                    && req.body
                        == Some(json!({"files": [{"name": "a.pdf", "url": "http://x/a.pdf"}]}))
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    200,
                    r#"{"result":[{"id":"f1","name":"a.pdf","url":"http://x/a.pdf","status":"indexing"}]}"#,
                ))
            });

        let registry = FileRegistry::new(transport);
        let files = registry
            .add("c1", &[FileToAdd::new("a.pdf", "http://x/a.pdf")])
            .await
            .expect("add should succeed");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "f1");
        assert_eq!(files[0].status, FileStatus::Indexing);
    }

    #[tokio::test]
    async fn add_validates_before_sending() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let registry = FileRegistry::new(transport);

        let blank_url = registry.add("c1", &[FileToAdd::new("a.pdf", "")]).await;
        assert_eq!(blank_url.unwrap_err().kind(), ErrorKind::Precondition);

        let no_files = registry.add("c1", &[]).await;
        assert_eq!(no_files.unwrap_err().kind(), ErrorKind::Precondition);

        let no_collection = registry
            .add("", &[FileToAdd::new("a.pdf", "http://x/a.pdf")])
            .await;
        assert_eq!(no_collection.unwrap_err().kind(), ErrorKind::Precondition);
    }

    #[tokio::test]
    async fn list_surfaces_platform_error_code() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(ApiResponse::new(
                404,
                r#"{"error":{"code":"not_found","message":"no such collection"}}"#,
            ))
        });

        let err = FileRegistry::new(transport).list("c1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Platform);
        assert_eq!(err.code(), Some("not_found"));
    }

    #[tokio::test]
    async fn list_reports_malformed_success_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(ApiResponse::new(200, r#"{"files":[]}"#)));

        let err = FileRegistry::new(transport).list("c1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn transport_failure_propagates_unchanged() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(Error::transport("connection refused")));

        let err = FileRegistry::new(transport)
            .delete("c1", &["f1".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn delete_sends_ids_and_accepts_empty_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Delete
                    && req.path == "/api/v1/collections/c1/files"
                    && req.body == Some(json!({"file_ids": ["f1", "f2"]}))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(204, "")));

        FileRegistry::new(transport)
            .delete("c1", &["f1".to_string(), "f2".to_string()])
            .await
            .expect("delete should succeed");
    }

    #[tokio::test]
    async fn delete_without_collection_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let err = FileRegistry::new(transport)
            .delete("", &["f1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }
}
