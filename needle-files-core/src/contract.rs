//! # contract: the transport seam between client logic and HTTP
//!
//! Every remote operation in this crate is expressed as an [`ApiRequest`] handed to a
//! [`Transport`], which answers with the raw [`ApiResponse`]. Status handling and envelope
//! decoding stay in the clients, so a transport only has to move bytes.
//!
//! ## Implementations
//! - `needle_files::http::HttpTransport` talks to the platform over reqwest.
//! - [`MockTransport`] (exported under `cfg(test)` or the `test-export-mocks` feature) is a
//!   `mockall` double used to script responses and count calls in tests.
//!
//! ## Contract
//! - A transport never interprets status codes: a 404 is a successful exchange.
//! - Any failure to complete the exchange (connect, DNS, timeout, reading the body) must be
//!   returned as [`Error::Transport`].

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A request relative to the platform base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/api/v1/collections/c1/files`.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body,
        }
    }
}

/// Raw platform answer: status code and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Turn a status >= 400 into a platform error, passing success through.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_error() {
            Err(Error::from_response(self.status, &self.body))
        } else {
            Ok(self)
        }
    }
}

/// Capability to exchange one request/response pair with the platform.
///
/// Implementations attach authentication and enforce the request timeout.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        (**self).send(request).await
    }
}
