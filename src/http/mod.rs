//! HTTP transport module
//!
//! The core never talks to reqwest directly; it hands `ApiRequest`s to a
//! `Transport` and maps the raw `ApiResponse` itself.
//!
//! # Features
//!
//! - **Pluggable transport**: anything implementing `Transport` can serve requests
//! - **Format headers**: `Accept`/`Content-Type` follow the body format
//! - **Token replay**: a 401 under token auth refreshes the token and replays once
//! - **Timeouts**: the configured timeout surfaces as `Error::Timeout`
//! - **File uploads**: an `Upload` goes out as a single-part multipart form

mod client;
mod types;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use types::{ApiRequest, ApiResponse, Transport, Upload};

#[cfg(test)]
mod tests;
