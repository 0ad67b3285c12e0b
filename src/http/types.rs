//! Transport abstraction and request/response types

use crate::error::Result;
use crate::types::{Format, Method};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

/// A file sent as a `multipart/form-data` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// MIME type of the part
    pub content_type: String,
    /// File contents
    pub data: Bytes,
}

/// One request against the server, relative to its base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP verb
    pub method: Method,
    /// Path below the server URL, e.g. `JSSResource/computers/id/1`
    pub path: String,
    /// Body format, also used for the `Accept` header
    pub format: Format,
    /// Extra headers
    pub headers: BTreeMap<String, String>,
    /// Serialized body
    pub body: Option<String>,
    /// File part; replaces `body` when set
    pub upload: Option<Upload>,
}

impl ApiRequest {
    /// Create a request without a body
    pub fn new(method: Method, path: impl Into<String>, format: Format) -> Self {
        Self {
            method,
            path: path.into(),
            format,
            headers: BTreeMap::new(),
            body: None,
            upload: None,
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>, format: Format) -> Self {
        Self::new(Method::GET, path, format)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>, format: Format) -> Self {
        Self::new(Method::DELETE, path, format)
    }

    /// POST request with a body
    pub fn post(path: impl Into<String>, format: Format, body: impl Into<String>) -> Self {
        Self::new(Method::POST, path, format).with_body(body)
    }

    /// PUT request with a body
    pub fn put(path: impl Into<String>, format: Format, body: impl Into<String>) -> Self {
        Self::new(Method::PUT, path, format).with_body(body)
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Send a file as a multipart form instead of a serialized body
    #[must_use]
    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Raw server reply; statuses are not interpreted here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl ApiResponse {
    /// Create a response
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body format implied by the declared content type
    pub fn format(&self) -> Option<Format> {
        self.content_type
            .as_deref()
            .and_then(Format::from_content_type)
    }
}

/// Executes requests against the server.
///
/// Implementations must not map statuses to errors; only failures to get
/// any response at all (connection, TLS, timeout) are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return whatever the server answered
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
