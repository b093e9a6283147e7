/// `load_config` module: reads the optional YAML settings file of the CLI and combines it with
/// environment variables into the platform config and default poll policy.
///
/// # Responsibilities
/// - Parse the user-supplied YAML (`url`, `collection_id`, `poll`) into typed structs
/// - Inject the API key from the environment; secrets are never read from YAML
/// - Produce clear diagnostics for unreadable or malformed files
///
/// # Precedence
/// - Platform URL: `NEEDLE_URL`, then the YAML `url`, then the public default.
/// - Collection id and poll settings: command-line flags, then YAML.
///
/// # Errors
/// All errors in this module use `anyhow::Error`, surfaced at the CLI boundary.
use anyhow::{Context, Result};
use needle_files_core::config::{API_KEY_ENV, DEFAULT_URL, SEARCH_URL_ENV, URL_ENV};
use needle_files_core::{NeedleConfig, PollPolicy};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Collection used when a command does not pass `--collection`.
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub poll: PollSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollSection {
    pub interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl PollSection {
    /// Fill unset fields from `fallback`.
    pub fn or(&self, fallback: &PollSection) -> PollSection {
        PollSection {
            interval_secs: self.interval_secs.or(fallback.interval_secs),
            max_attempts: self.max_attempts.or(fallback.max_attempts),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
        }
    }

    pub fn to_policy(&self) -> PollPolicy {
        let mut policy = PollPolicy::default();
        if let Some(secs) = self.interval_secs {
            policy = policy.with_interval(Duration::from_secs(secs));
        }
        if let Some(max) = self.max_attempts {
            policy = policy.with_max_attempts(max);
        }
        if let Some(secs) = self.timeout_secs {
            policy = policy.with_timeout(Duration::from_secs(secs));
        }
        policy
    }
}

impl CliConfig {
    /// Build the platform config, taking the API key from `NEEDLE_API_KEY`.
    pub fn platform_config(&self) -> Result<NeedleConfig> {
        let api_key = env::var(API_KEY_ENV)
            .with_context(|| format!("{API_KEY_ENV} missing in environment"))?;
        let url = env::var(URL_ENV)
            .ok()
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        let mut config = NeedleConfig::new(api_key, &url)?;
        if let Ok(search_url) = env::var(SEARCH_URL_ENV) {
            config = config.with_search_url(&search_url)?;
        }
        config.trace_loaded();
        Ok(config)
    }
}

/// Loads the YAML settings file. Secrets are injected later from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let config: CliConfig = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;

    info!(
        config_path = ?path_ref,
        url = config.url.as_deref().unwrap_or(DEFAULT_URL),
        collection_id = config.collection_id.as_deref().unwrap_or("<none>"),
        "Parsed config YAML successfully"
    );
    Ok(config)
}
