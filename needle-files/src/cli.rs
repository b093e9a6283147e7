//! This module implements the CLI for needle-files: command parsing, collection-id
//! resolution and printing results as JSON on stdout.
//!
//! All client logic (requests, error taxonomy, indexing wait) lives in [`needle-files-core`];
//! this module only wires flags and the YAML settings file into those clients.
//!
//! ## How To Use
//! - Command-line users: run `needle-files --help`.
//! - Programmatic/integration use: call [`run`] with a parsed [`Cli`], or [`execute`] with
//!   any [`Transport`] (e.g. a mock) to skip config and HTTP setup.
//!
//! [`needle-files-core`]: ../../needle-files-core/

use crate::http::HttpTransport;
use crate::load_config::{load_config, CliConfig, PollSection};
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use needle_files_core::contract::Transport;
use needle_files_core::{CancellationToken, FileToAdd, NeedleClient, NewCollection};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for needle-files: manage collection files and wait for indexing.
#[derive(Parser)]
#[clap(
    name = "needle-files",
    version,
    about = "Manage files in Needle collections and wait for them to be indexed"
)]
pub struct Cli {
    /// Optional YAML settings file (url, collection_id, poll)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, inspect and delete collections
    #[clap(subcommand)]
    Collections(CollectionCommands),
    /// Add, list and delete files in a collection
    #[clap(subcommand)]
    Files(FileCommands),
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    Create {
        #[clap(long)]
        name: String,
        /// Embedding model for the new collection
        #[clap(long)]
        model: Option<String>,
    },
    Get {
        id: String,
    },
    List,
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// List every file in a collection
    List {
        #[clap(long)]
        collection: Option<String>,
    },
    /// Submit a file by URL without waiting for indexing
    Add {
        #[clap(long)]
        collection: Option<String>,
        #[clap(long)]
        url: String,
        /// Defaults to the URL
        #[clap(long)]
        name: Option<String>,
    },
    Delete {
        #[clap(long)]
        collection: Option<String>,
        #[clap(required = true)]
        file_ids: Vec<String>,
    },
    /// Add a file by URL and wait until it is indexed
    AddUrl {
        #[clap(long)]
        collection: Option<String>,
        url: String,
        /// Replace an existing file with the same name
        #[clap(long)]
        overwrite: bool,
        #[clap(flatten)]
        poll: PollArgs,
    },
    /// Wait until files in a collection are indexed
    Wait {
        #[clap(long)]
        collection: Option<String>,
        /// Only wait for files with this name
        #[clap(long)]
        name: Option<String>,
        #[clap(flatten)]
        poll: PollArgs,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct PollArgs {
    /// Seconds between status checks (default 5)
    #[clap(long)]
    pub interval_secs: Option<u64>,
    #[clap(long)]
    pub max_attempts: Option<u32>,
    /// Give up after this many seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,
}

impl PollArgs {
    fn section(&self) -> PollSection {
        PollSection {
            interval_secs: self.interval_secs,
            max_attempts: self.max_attempts,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    tracing::info!("cli_started");

    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    let platform = settings.platform_config()?;
    let transport = Arc::new(HttpTransport::new(&platform)?);
    let client = NeedleClient::new(platform, transport);

    let output = execute(&client, &settings, cli.command, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run one command against `client` and return its JSON output.
pub async fn execute<T>(
    client: &NeedleClient<T>,
    settings: &CliConfig,
    command: Commands,
    cancel: &CancellationToken,
) -> Result<Value>
where
    T: Transport + ?Sized,
{
    let output = match command {
        Commands::Collections(command) => match command {
            CollectionCommands::Create { name, model } => {
                let mut request = NewCollection::new(name);
                if let Some(model) = model {
                    request = request.with_model(model);
                }
                json!(client.collections.create(&request).await?)
            }
            CollectionCommands::Get { id } => json!(client.collections.get(&id).await?),
            CollectionCommands::List => json!(client.collections.list().await?),
            CollectionCommands::Delete { id } => {
                client.collections.delete(&id).await?;
                json!({ "deleted": id })
            }
        },
        Commands::Files(command) => match command {
            FileCommands::List { collection } => {
                let mut session = client.session();
                let collection = collection.or_else(|| settings.collection_id.clone());
                json!(session.list(collection.as_deref()).await?)
            }
            FileCommands::Add {
                collection,
                url,
                name,
            } => {
                let collection = require_collection(collection, settings)?;
                let file = match name {
                    Some(name) => FileToAdd::new(name, url),
                    None => FileToAdd::from_url(url),
                };
                json!(client.files.add(&collection, &[file]).await?)
            }
            FileCommands::Delete {
                collection,
                file_ids,
            } => {
                let mut session = client.session();
                if let Some(id) = collection.or_else(|| settings.collection_id.clone()) {
                    session.set_collection(id);
                }
                session.delete(&file_ids).await?;
                json!({ "deleted": file_ids })
            }
            FileCommands::AddUrl {
                collection,
                url,
                overwrite,
                poll,
            } => {
                let mut session = client
                    .session()
                    .with_poll_policy(poll.section().or(&settings.poll).to_policy());
                if let Some(id) = collection.or_else(|| settings.collection_id.clone()) {
                    session.set_collection(id);
                }
                let report = session.add_file_from_url(&url, overwrite, cancel).await?;
                json!(report)
            }
            FileCommands::Wait {
                collection,
                name,
                poll,
            } => {
                let collection = require_collection(collection, settings)?;
                let policy = poll.section().or(&settings.poll).to_policy();
                let report = client
                    .poller(policy)
                    .wait_for_indexing(&collection, name.as_deref(), cancel)
                    .await?;
                json!(report)
            }
        },
    };
    Ok(output)
}

fn require_collection(collection: Option<String>, settings: &CliConfig) -> Result<String> {
    collection
        .or_else(|| settings.collection_id.clone())
        .ok_or_else(|| {
            anyhow!("no collection id: pass --collection or set collection_id in the config file")
        })
}
