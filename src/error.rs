//! Error types for the JSS client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::types::Method;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Server error pages carry their detail in `<p>` paragraphs.
static PARAGRAPH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<p>(.*?)</p>").ok());

/// The main error type for the JSS client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // Server Errors
    // ============================================================================
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("{operation} is not permitted for {resource}")]
    OperationNotPermitted { resource: String, operation: Method },

    #[error("Request failed with HTTP {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // Local Validation Errors
    // ============================================================================
    #[error("{resource} cannot be searched by '{key}'")]
    UnsupportedSearchKey { resource: String, key: String },

    #[error("Invalid construction argument: {message}")]
    InvalidConstructionArgument { message: String },

    #[error("Unknown resource type: {name}")]
    UnknownResource { name: String },

    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Index {index} out of range for collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Distribution Errors
    // ============================================================================
    #[error("Distribution point '{point}': {message}")]
    Distribution { point: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an operation-not-permitted error
    pub fn not_permitted(resource: impl Into<String>, operation: Method) -> Self {
        Self::OperationNotPermitted {
            resource: resource.into(),
            operation,
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an invalid construction argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidConstructionArgument {
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a distribution error
    pub fn distribution(point: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Distribution {
            point: point.into(),
            message: message.into(),
        }
    }

    /// Map a failed HTTP status to the matching error kind.
    ///
    /// 401 is always an authentication failure and 404 always not-found;
    /// every other status is a generic request failure carrying the best
    /// message that could be pulled out of the body.
    pub fn from_status(status: u16, body: &str, path: &str) -> Self {
        match status {
            401 => Self::authentication(format!(
                "server rejected credentials for {path}: {}",
                extract_error_message(body, status)
            )),
            404 => Self::not_found(path),
            _ => Self::RequestFailed {
                status,
                message: extract_error_message(body, status),
            },
        }
    }

    /// Check if this error means the remote record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check if this error is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { .. } => Some(401),
            Error::NotFound { .. } => Some(404),
            Error::RequestFailed { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Error pages embed their detail in HTML paragraphs; when there are none the
/// trimmed body is used, and an empty body falls back to the status reason.
pub fn extract_error_message(body: &str, status: u16) -> String {
    if let Some(re) = PARAGRAPH.as_ref() {
        let paragraphs: Vec<&str> = re
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return paragraphs.join("; ");
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown error")
        .to_string()
}

/// Result type alias for the JSS client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("url");
        assert_eq!(err.to_string(), "Missing required config field: url");

        let err = Error::not_permitted("Computer", Method::POST);
        assert_eq!(err.to_string(), "POST is not permitted for Computer");
    }

    #[test]
    fn test_status_mapping() {
        assert!(Error::from_status(401, "", "computers").is_authentication());
        assert!(Error::from_status(404, "", "computers/id/9").is_not_found());

        match Error::from_status(409, "<html><p>Error: Duplicate name</p></html>", "p") {
            Error::RequestFailed { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Error: Duplicate name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(Error::from_status(500, "boom", "x").status(), Some(500));
        assert_eq!(Error::not_found("x").status(), Some(404));
        assert_eq!(Error::config("x").status(), None);
    }

    #[test]
    fn test_extract_message_joins_paragraphs() {
        let body = "<html><body><p>Conflict</p><p>Error: Problem with category</p></body></html>";
        assert_eq!(
            extract_error_message(body, 409),
            "Conflict; Error: Problem with category"
        );
    }

    #[test]
    fn test_extract_message_falls_back_to_body() {
        assert_eq!(extract_error_message("  plain failure \n", 400), "plain failure");
        assert_eq!(extract_error_message("", 503), "Service Unavailable");
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
