//! # poller: wait for asynchronous indexing to finish
//!
//! Adding a file only submits it; the platform indexes it in the background. The
//! [`IndexingPoller`] re-lists the collection on a fixed interval until every file it is
//! watching has reached a terminal status (`indexed` or `error`), then returns an
//! [`IndexingReport`].
//!
//! ## Termination
//! - A name-scoped wait needs at least one file with that name in the snapshot. An empty
//!   snapshot means the add is not visible yet, so polling continues.
//! - A whole-collection wait over an empty collection completes immediately.
//! - After an add, the wait follows the ids the platform returned for the new file, so a
//!   stale listing that still shows a replaced copy does not end it early. It falls back to
//!   the file name when the add response carries no files.
//! - [`PollPolicy`] may bound the wait by attempts and/or elapsed time; the default is
//!   unbounded. Exhausting a bound yields [`Error::PollExhausted`].
//! - The [`CancellationToken`] interrupts the interval sleep and yields [`Error::Cancelled`].
//!
//! Files ending in `error` do not fail the call. They are logged and listed in
//! [`IndexingReport::failed`].

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::contract::Transport;
use crate::error::{Error, Result};
use crate::model::{CollectionFile, FileStatus, FileToAdd};
use crate::registry::{require_collection_id, FileRegistry};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// How often to poll and when to give up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of list calls, if bounded.
    pub max_attempts: Option<u32>,
    /// Maximum total wait, if bounded.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Final snapshot of the watched files once all of them are terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexingReport {
    pub files: Vec<CollectionFile>,
    /// Names of files whose indexing ended in `error`.
    pub failed: Vec<String>,
}

impl IndexingReport {
    fn from_files(files: Vec<CollectionFile>) -> Self {
        let failed = files
            .iter()
            .filter(|f| f.status == FileStatus::Error)
            .map(|f| f.name.clone())
            .collect();
        Self { files, failed }
    }

    pub fn all_indexed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Polls a [`FileRegistry`] until watched files reach a terminal status.
pub struct IndexingPoller<'a, T> {
    registry: &'a FileRegistry<T>,
    policy: PollPolicy,
}

impl<'a, T: Transport> IndexingPoller<'a, T> {
    pub fn new(registry: &'a FileRegistry<T>, policy: PollPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Add the file at `file_url` (named after the URL) and wait until it is indexed.
    ///
    /// If a file with that name already exists the call fails with [`Error::Conflict`]
    /// unless `overwrite` is set, in which case every file with that name is deleted in a
    /// single request before the add.
    pub async fn add_from_url(
        &self,
        collection_id: &str,
        file_url: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<IndexingReport> {
        require_collection_id(collection_id)?;
        let file = FileToAdd::from_url(file_url);
        file.validate()?;

        let existing: Vec<String> = self
            .registry
            .list(collection_id)
            .await?
            .into_iter()
            .filter(|f| f.name == file_url)
            .map(|f| f.id)
            .collect();

        if !existing.is_empty() {
            if !overwrite {
                warn!(collection_id, file_url, "File already exists, not overwriting");
                return Err(Error::Conflict {
                    name: file_url.to_string(),
                    collection_id: collection_id.to_string(),
                });
            }
            info!(collection_id, file_url, file_ids = ?existing, "Replacing existing file");
            self.registry.delete(collection_id, &existing).await?;
        }

        let added: Vec<String> = self
            .registry
            .add(collection_id, &[file])
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();

        // A listing taken right after an overwrite may still show the deleted copy.
        let watch = if added.is_empty() {
            Watch::Named(file_url)
        } else {
            Watch::Ids {
                ids: &added,
                name: file_url,
            }
        };
        let report = self.poll(collection_id, watch, cancel).await?;
        if report.all_indexed() {
            info!(collection_id, file_url, "Successfully added file to collection");
        }
        Ok(report)
    }

    /// Poll until every file named `name` (or every file, if `None`) is terminal.
    pub async fn wait_for_indexing(
        &self,
        collection_id: &str,
        name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<IndexingReport> {
        require_collection_id(collection_id)?;
        let watch = match name {
            Some(name) => Watch::Named(name),
            None => Watch::Everything,
        };
        self.poll(collection_id, watch, cancel).await
    }

    async fn poll(
        &self,
        collection_id: &str,
        watch: Watch<'_>,
        cancel: &CancellationToken,
    ) -> Result<IndexingReport> {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            let snapshot = self.registry.list(collection_id).await?;
            let watched = watch.select(snapshot);
            debug!(
                collection_id,
                attempts,
                watched = watched.len(),
                pending = watched.iter().filter(|f| !f.status.is_terminal()).count(),
                "Polled indexing status"
            );
            for file in watched.iter().filter(|f| f.status == FileStatus::Unknown) {
                warn!(file = %file.name, "Unrecognised file status, still waiting");
            }

            let visible = !watch.needs_match() || !watched.is_empty();
            if visible && watched.iter().all(|f| f.status.is_terminal()) {
                let report = IndexingReport::from_files(watched);
                if !report.failed.is_empty() {
                    warn!(
                        collection_id,
                        failed = %report.failed.join(", "),
                        "Files failed to index"
                    );
                }
                return Ok(report);
            }

            if self.policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(exhausted(attempts, &watched, watch.name()));
            }
            let mut pause = self.policy.interval;
            if let Some(timeout) = self.policy.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(exhausted(attempts, &watched, watch.name()));
                }
                pause = pause.min(timeout - elapsed);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(collection_id, attempts, "Indexing wait cancelled");
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}

/// Which files of a snapshot a wait is tracking.
enum Watch<'w> {
    Everything,
    Named(&'w str),
    Ids { ids: &'w [String], name: &'w str },
}

impl Watch<'_> {
    fn select(&self, snapshot: Vec<CollectionFile>) -> Vec<CollectionFile> {
        match self {
            Watch::Everything => snapshot,
            Watch::Named(name) => snapshot.into_iter().filter(|f| f.name == *name).collect(),
            Watch::Ids { ids, .. } => snapshot.into_iter().filter(|f| ids.contains(&f.id)).collect(),
        }
    }

    /// Whether an empty selection means "not visible yet" rather than "done".
    fn needs_match(&self) -> bool {
        !matches!(self, Watch::Everything)
    }

    fn name(&self) -> Option<&str> {
        match self {
            Watch::Everything => None,
            Watch::Named(name) | Watch::Ids { name, .. } => Some(*name),
        }
    }
}

fn exhausted(attempts: u32, watched: &[CollectionFile], name: Option<&str>) -> Error {
    let mut pending: Vec<String> = watched
        .iter()
        .filter(|f| !f.status.is_terminal())
        .map(|f| f.name.clone())
        .collect();
    if pending.is_empty() {
        if let Some(name) = name {
            pending.push(name.to_string());
        }
    }
    warn!(attempts, pending = %pending.join(", "), "Gave up waiting for indexing");
    Error::PollExhausted { attempts, pending }
}
