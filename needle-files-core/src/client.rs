use std::sync::Arc;

use crate::collections::CollectionsClient;
use crate::config::NeedleConfig;
use crate::contract::Transport;
use crate::poller::{IndexingPoller, PollPolicy};
use crate::registry::FileRegistry;
use crate::session::CollectionSession;

/// Entry point bundling the platform config with clients sharing one transport.
pub struct NeedleClient<T: ?Sized> {
    config: NeedleConfig,
    pub collections: CollectionsClient<Arc<T>>,
    pub files: FileRegistry<Arc<T>>,
}

impl<T: Transport + ?Sized> NeedleClient<T> {
    pub fn new(config: NeedleConfig, transport: Arc<T>) -> Self {
        Self {
            config,
            collections: CollectionsClient::new(Arc::clone(&transport)),
            files: FileRegistry::new(transport),
        }
    }

    pub fn config(&self) -> &NeedleConfig {
        &self.config
    }

    pub fn poller(&self, policy: PollPolicy) -> IndexingPoller<'_, Arc<T>> {
        IndexingPoller::new(&self.files, policy)
    }

    /// A session over a new registry that shares this client's transport.
    pub fn session(&self) -> CollectionSession<Arc<T>> {
        CollectionSession::new(FileRegistry::new(Arc::clone(self.files.transport())))
    }
}
