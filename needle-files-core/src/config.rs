use std::env;
use std::time::Duration;

use tracing::{debug, info};
use url::{Host, Url};

use crate::error::{Error, Result};

pub const DEFAULT_URL: &str = "https://needle-ai.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const API_KEY_ENV: &str = "NEEDLE_API_KEY";
pub const URL_ENV: &str = "NEEDLE_URL";
pub const SEARCH_URL_ENV: &str = "NEEDLE_SEARCH_URL";

/// Connection settings for the platform.
#[derive(Clone)]
pub struct NeedleConfig {
    api_key: String,
    url: Url,
    search_url: Url,
    timeout: Duration,
}

impl NeedleConfig {
    /// Build a config for `url`, deriving the search endpoint as `search.<host>`.
    pub fn new(api_key: impl Into<String>, url: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("API key must not be empty"));
        }
        let url = Url::parse(url).map_err(|e| Error::config(format!("invalid url {url}: {e}")))?;
        let search_url = derive_search_url(&url)?;
        Ok(Self {
            api_key,
            url,
            search_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_search_url(mut self, search_url: &str) -> Result<Self> {
        self.search_url = Url::parse(search_url)
            .map_err(|e| Error::config(format!("invalid search url {search_url}: {e}")))?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `NEEDLE_API_KEY` (required), `NEEDLE_URL` and `NEEDLE_SEARCH_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .map_err(|_| Error::config(format!("{API_KEY_ENV} missing in environment")))?;
        let url = env::var(URL_ENV).unwrap_or_else(|_| DEFAULT_URL.to_string());
        let mut config = Self::new(api_key, &url)?;
        if let Ok(search_url) = env::var(SEARCH_URL_ENV) {
            config = config.with_search_url(&search_url)?;
        }
        config.trace_loaded();
        Ok(config)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn trace_loaded(&self) {
        info!(
            url = %self.url,
            search_url = %self.search_url,
            api_key_set = !self.api_key.is_empty(),
            "Loaded platform config"
        );
        debug!(timeout = ?self.timeout, "Platform config timeout");
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for NeedleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeedleConfig")
            .field("api_key", &"<redacted>")
            .field("url", &self.url.as_str())
            .field("search_url", &self.search_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn derive_search_url(url: &Url) -> Result<Url> {
    let domain = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        // IP literals have no subdomain to prefix; search shares the host.
        Some(_) => return Ok(url.clone()),
        None => return Err(Error::config(format!("url {url} has no host"))),
    };
    let mut search_url = url.clone();
    search_url
        .set_host(Some(&format!("search.{domain}")))
        .map_err(|e| Error::config(format!("cannot derive search url from {url}: {e}")))?;
    Ok(search_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn derives_search_host() {
        let config = NeedleConfig::new("key", "https://needle-ai.com").unwrap();
        assert_eq!(config.search_url().as_str(), "https://search.needle-ai.com/");
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn explicit_search_url_wins() {
        let config = NeedleConfig::new("key", "http://localhost:8080")
            .unwrap()
            .with_search_url("http://localhost:9090")
            .unwrap();
        assert_eq!(config.search_url().as_str(), "http://localhost:9090/");
    }

    #[test]
    fn ip_hosts_share_the_search_host() {
        let config = NeedleConfig::new("key", "http://127.0.0.1:8080").unwrap();
        assert_eq!(config.search_url().as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn rejects_blank_key_and_bad_url() {
        assert!(matches!(
            NeedleConfig::new(" ", DEFAULT_URL),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            NeedleConfig::new("key", "not a url"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn debug_output_hides_key() {
        let config = NeedleConfig::new("super-secret", DEFAULT_URL).unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    #[serial]
    fn from_env_requires_api_key() {
        env::remove_var(API_KEY_ENV);
        assert!(matches!(NeedleConfig::from_env(), Err(Error::Config(_))));

        env::set_var(API_KEY_ENV, "k");
        env::set_var(URL_ENV, "http://localhost:3000");
        env::remove_var(SEARCH_URL_ENV);
        let config = NeedleConfig::from_env().unwrap();
        assert_eq!(config.api_key(), "k");
        assert_eq!(config.url().as_str(), "http://localhost:3000/");
        assert_eq!(config.search_url().as_str(), "http://search.localhost:3000/");

        env::remove_var(API_KEY_ENV);
        env::remove_var(URL_ENV);
    }
}
