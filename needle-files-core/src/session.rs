//! Stateful convenience wrapper that remembers the selected collection.
//!
//! A [`CollectionSession`] is meant for one logical caller working on one collection at a
//! time. Changing the selection takes `&mut self`, so sharing a session between tasks that
//! target different collections does not compile without explicit synchronisation. Code
//! that needs to serve several collections concurrently should use
//! [`FileRegistry`](crate::registry::FileRegistry) directly.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::contract::Transport;
use crate::error::{Error, Result};
use crate::model::{CollectionFile, FileToAdd};
use crate::poller::{IndexingPoller, IndexingReport, PollPolicy};
use crate::registry::FileRegistry;

pub struct CollectionSession<T> {
    registry: FileRegistry<T>,
    collection_id: Option<String>,
    policy: PollPolicy,
}

impl<T: Transport> CollectionSession<T> {
    pub fn new(registry: FileRegistry<T>) -> Self {
        Self {
            registry,
            collection_id: None,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Select the collection used by calls that do not name one. No I/O.
    pub fn set_collection(&mut self, collection_id: impl Into<String>) {
        let collection_id = collection_id.into();
        debug!(collection_id = %collection_id, "Selected collection");
        self.collection_id = Some(collection_id);
    }

    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    pub fn registry(&self) -> &FileRegistry<T> {
        &self.registry
    }

    fn selected(&self) -> Result<&str> {
        match self.collection_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(Error::precondition("no collection selected")),
        }
    }

    /// Add files to an explicitly named collection. Does not change the selection.
    pub async fn add(&self, collection_id: &str, files: &[FileToAdd]) -> Result<Vec<CollectionFile>> {
        self.registry.add(collection_id, files).await
    }

    /// List files. A given id also becomes the selected collection.
    pub async fn list(&mut self, collection_id: Option<&str>) -> Result<Vec<CollectionFile>> {
        if let Some(id) = collection_id {
            self.set_collection(id);
        }
        let id = self.selected()?;
        self.registry.list(id).await
    }

    pub async fn delete(&self, file_ids: &[String]) -> Result<()> {
        let id = self.selected()?;
        self.registry.delete(id, file_ids).await
    }

    /// Add a file by URL to the selected collection and wait for it to be indexed.
    pub async fn add_file_from_url(
        &self,
        file_url: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<IndexingReport> {
        let id = self.selected()?;
        IndexingPoller::new(&self.registry, self.policy.clone())
            .add_from_url(id, file_url, overwrite, cancel)
            .await
    }

    /// Wait for files in the selected collection (optionally only those named `name`).
    pub async fn wait_for_indexing(
        &self,
        name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<IndexingReport> {
        let id = self.selected()?;
        IndexingPoller::new(&self.registry, self.policy.clone())
            .wait_for_indexing(id, name, cancel)
            .await
    }
}
