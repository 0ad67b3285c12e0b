//! Common types used throughout the JSS client
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP verbs the server understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
}

impl Method {
    /// All verbs, in the order the catalog lists them
    pub const ALL: [Method; 4] = [Method::GET, Method::PUT, Method::POST, Method::DELETE];

    /// Upper-case verb name
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Body Format
// ============================================================================

/// Wire format of request and response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Tag-per-field XML documents
    #[default]
    Xml,
    /// JSON objects
    Json,
}

impl Format {
    /// Value for the `Content-Type` and `Accept` headers
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Xml => "text/xml",
            Format::Json => "application/json",
        }
    }

    /// Guess the format from a declared content type
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_ascii_lowercase();
        if lower.contains("json") {
            Some(Format::Json)
        } else if lower.contains("xml") {
            Some(Format::Xml)
        } else {
            None
        }
    }
}

// ============================================================================
// API Family
// ============================================================================

/// Which generation of the server API a resource type lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFamily {
    /// Legacy XML endpoints under `JSSResource/`
    #[default]
    Classic,
    /// Newer JSON endpoints under `api/`
    Pro,
}

impl ApiFamily {
    /// Path prefix every endpoint of this family lives under
    pub fn prefix(self) -> &'static str {
        match self {
            ApiFamily::Classic => "JSSResource",
            ApiFamily::Pro => "api",
        }
    }

    /// Body format used by this family
    pub fn format(self) -> Format {
        match self {
            ApiFamily::Classic => Format::Xml,
            ApiFamily::Pro => Format::Json,
        }
    }
}
