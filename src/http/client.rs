//! reqwest-backed transport
//!
//! Provides the default `Transport` that handles:
//! - Base URL joining and default headers
//! - Authentication, including the one-shot token refresh on 401
//! - TLS verification and request timeouts
//! - Multipart bodies for file uploads

use super::types::{ApiRequest, ApiResponse, Transport};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest body excerpt written to the debug log
const LOG_BODY_LIMIT: usize = 512;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Verify the server's TLS certificate
    pub verify_tls: bool,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            verify_tls: true,
            default_headers: HashMap::new(),
            user_agent: format!("jss-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client implementing `Transport`
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
}

impl HttpClient {
    /// Create a client without authentication
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(Error::Http)?;

        if !config.verify_tls {
            warn!("TLS certificate verification is disabled");
        }

        Ok(Self {
            client,
            config,
            authenticator: None,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.set_authenticator(auth_config);
        Ok(client)
    }

    /// Set the authenticator
    pub fn set_authenticator(&mut self, auth_config: AuthConfig) {
        self.authenticator = match auth_config {
            AuthConfig::None => None,
            config => Some(Authenticator::with_client(config, self.client.clone())),
        };
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Send one attempt of a request
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.build_url(&request.path);
        let content_type = request.format.content_type();

        let mut req = self
            .client
            .request(request.method.into(), &url)
            .header(reqwest::header::ACCEPT, content_type);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(upload) = &request.upload {
            let part = Part::bytes(upload.data.to_vec())
                .file_name(upload.file_name.clone())
                .mime_str(&upload.content_type)
                .map_err(Error::Http)?;
            req = req.multipart(Form::new().part(upload.field.clone(), part));
        } else if let Some(body) = &request.body {
            req = req
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body.clone());
        }

        if let Some(auth) = &self.authenticator {
            req = auth.apply(req).await?;
        }

        debug!("{} {}", request.method, url);
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await.map_err(Error::Http)?;

        debug!(
            status,
            "{} {} -> {}",
            request.method,
            url,
            truncate(&body, LOG_BODY_LIMIT)
        );
        Ok(ApiResponse::new(status, declared, body))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let response = self.send(request).await?;

        if response.status == 401 {
            if let Some(auth) = self.authenticator.as_ref().filter(|a| a.is_refreshable()) {
                warn!(
                    "{} {} was rejected with 401; refreshing token and retrying once",
                    request.method, request.path
                );
                auth.invalidate().await;
                return self.send(request).await;
            }
        }

        Ok(response)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field(
                "auth",
                &self.authenticator.as_ref().map(|a| a.config().kind()),
            )
            .finish_non_exhaustive()
    }
}

/// Shorten text for logging without splitting a character
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
