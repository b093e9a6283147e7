//! # HTTP transport
//!
//! [`HttpTransport`] is the production [`Transport`] for the core clients: it sends each
//! [`ApiRequest`] with reqwest, authenticated with the `x-api-key` header and bounded by the
//! configured request timeout (120 s unless overridden).
//!
//! Status codes are passed through untouched; the clients in `needle-files-core` decide what
//! a 4xx/5xx means. Every reqwest failure (connect, DNS, timeout, reading the body) becomes
//! [`Error::Transport`].

use async_trait::async_trait;
use needle_files_core::contract::{ApiRequest, ApiResponse, Method, Transport};
use needle_files_core::{Error, NeedleConfig, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &NeedleConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.api_key())
            .map_err(|e| Error::config(format!("invalid API key: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        debug!(base_url = %config.url(), timeout = ?config.timeout(), "HTTP transport initialised");
        Ok(Self {
            client,
            base_url: config.url().clone(),
        })
    }

    /// Append `path` to the base URL, keeping any path prefix the base carries.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| Error::config(format!("invalid request path {path}: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.endpoint(&request.path)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(method = request.method.as_str(), %url, error = %e, "Request failed");
            Error::transport(e)
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(Error::transport)?;

        debug!(method = request.method.as_str(), %url, status, "Received response");
        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(&NeedleConfig::new("key", url).unwrap()).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let path = "/api/v1/collections/c1/files";
        assert_eq!(
            transport("https://gw.example.com/needle").endpoint(path).unwrap().as_str(),
            "https://gw.example.com/needle/api/v1/collections/c1/files"
        );
        assert_eq!(
            transport("https://gw.example.com/needle/").endpoint(path).unwrap().as_str(),
            "https://gw.example.com/needle/api/v1/collections/c1/files"
        );
        assert_eq!(
            transport("https://needle-ai.com").endpoint(path).unwrap().as_str(),
            "https://needle-ai.com/api/v1/collections/c1/files"
        );
    }
}
