#![doc = "needle-files-core: client logic for collection files on the Needle platform."]

//! This crate holds the transport-agnostic part of the client: the wire types, the
//! error taxonomy, the file and collection clients and the indexing poller.
//! The reqwest transport and the command-line front end live in the `needle-files` crate.
//!
//! # Usage
//! Implement [`contract::Transport`] (or use `needle_files::http::HttpTransport`), wrap it
//! in a [`NeedleClient`], then use [`registry::FileRegistry`] for explicit-collection calls
//! or [`session::CollectionSession`] when a selected collection is more convenient.

pub mod client;
pub mod collections;
pub mod config;
pub mod contract;
pub mod error;
pub mod model;
pub mod poller;
pub mod registry;
pub mod session;

pub use client::NeedleClient;
pub use config::NeedleConfig;
pub use error::{Error, ErrorKind, Result};
pub use model::{Collection, CollectionFile, FileStatus, FileToAdd, NewCollection};
pub use poller::{IndexingPoller, IndexingReport, PollPolicy};
pub use tokio_util::sync::CancellationToken;
