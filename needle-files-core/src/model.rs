//! Wire-level data types for collections and the files inside them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Indexing status of a file, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Indexing,
    Indexed,
    Error,
    /// Any status this client does not recognise. Treated as still in progress.
    #[serde(other)]
    Unknown,
}

impl FileStatus {
    /// `indexed` and `error` are final until the file is added again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Indexed | FileStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Indexing => "indexing",
            FileStatus::Indexed => "indexed",
            FileStatus::Error => "error",
            FileStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file known to the platform within a collection.
///
/// Only ever produced by deserializing a platform response; each `list` returns a fresh
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFile {
    pub id: String,
    /// Caller-supplied name; the de-duplication key inside a collection.
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Set when the file was ingested through a connector.
    #[serde(default)]
    pub connector_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub status: FileStatus,
}

/// A file to submit for indexing, referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToAdd {
    pub name: String,
    pub url: String,
}

impl FileToAdd {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// A file named after its own URL, as used by the add-from-URL workflow.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            url,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::precondition("file name must not be empty"));
        }
        if self.url.trim().is_empty() {
            return Err(Error::precondition(format!(
                "file url must not be empty (file {})",
                self.name
            )));
        }
        Ok(())
    }
}

/// A server-side grouping of files indexed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Request body for creating a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl NewCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_file_preserves_every_field() {
        let raw = json!({
            "id": "f1",
            "name": "a.pdf",
            "type": "application/pdf",
            "url": "http://x/a.pdf",
            "user_id": "u1",
            "connector_id": "k1",
            "size": 1024,
            "md5_hash": "9e107d9d372bb6826bd81d3542a419d6",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:05:00Z",
            "status": "indexed"
        });
        let file: CollectionFile = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(file.id, "f1");
        assert_eq!(file.name, "a.pdf");
        assert_eq!(file.file_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.url.as_deref(), Some("http://x/a.pdf"));
        assert_eq!(file.user_id.as_deref(), Some("u1"));
        assert_eq!(file.connector_id.as_deref(), Some("k1"));
        assert_eq!(file.size, Some(1024));
        assert_eq!(
            file.md5_hash.as_deref(),
            Some("9e107d9d372bb6826bd81d3542a419d6")
        );
        assert_eq!(file.created_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(file.updated_at.as_deref(), Some("2024-05-01T10:05:00Z"));
        assert_eq!(file.status, FileStatus::Indexed);

        assert_eq!(serde_json::to_value(&file).unwrap(), raw);
    }

    #[test]
    fn sparse_file_decodes_with_defaults() {
        let file: CollectionFile =
            serde_json::from_str(r#"{"id":"f2","name":"b.txt","status":"pending"}"#).unwrap();
        assert_eq!(file.status, FileStatus::Pending);
        assert!(file.connector_id.is_none());
        assert!(file.size.is_none());
    }

    #[test]
    fn unrecognised_status_is_not_terminal() {
        let file: CollectionFile =
            serde_json::from_str(r#"{"id":"f3","name":"c","status":"queued"}"#).unwrap();
        assert_eq!(file.status, FileStatus::Unknown);
        assert!(!file.status.is_terminal());
    }

    #[test]
    fn only_indexed_and_error_are_terminal() {
        assert!(FileStatus::Indexed.is_terminal());
        assert!(FileStatus::Error.is_terminal());
        assert!(!FileStatus::Indexing.is_terminal());
        assert!(!FileStatus::Pending.is_terminal());
    }

    #[test]
    fn file_to_add_rejects_blank_fields() {
        assert!(FileToAdd::new("a.pdf", "http://x/a.pdf").validate().is_ok());
        assert!(FileToAdd::new("", "http://x/a.pdf").validate().is_err());
        assert!(FileToAdd::new("a.pdf", "  ").validate().is_err());
    }

    #[test]
    fn from_url_names_file_after_url() {
        let file = FileToAdd::from_url("https://example.com/doc.pdf");
        assert_eq!(file.name, file.url);
    }
}
