//! Authenticator implementation
//!
//! Applies credentials to requests and manages the server-issued token.

use super::types::{AuthConfig, CachedToken};
use crate::error::{extract_error_message, Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached token for the token flow
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::Basic { username, password } => {
                Ok(req.basic_auth(username, Some(password)))
            }

            AuthConfig::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthConfig::Token { scheme, .. } => {
                let token = self.get_or_refresh_token().await?;
                Ok(req.header(reqwest::header::AUTHORIZATION, format!("{scheme} {token}")))
            }
        }
    }

    /// Whether a rejected request can be replayed with a new token
    pub fn is_refreshable(&self) -> bool {
        matches!(self.config, AuthConfig::Token { .. })
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Request a token from the token endpoint
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        let AuthConfig::Token {
            token_url,
            username,
            password,
            ..
        } = &self.config
        else {
            return Err(Error::TokenRefresh {
                message: format!("{} auth does not use tokens", self.config.kind()),
            });
        };

        debug!("Requesting API token from {token_url}");
        let response = self
            .http_client
            .post(token_url)
            .basic_auth(username, Some(password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status().as_u16();
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::authentication(format!(
                "token endpoint rejected credentials: {}",
                extract_error_message(&body, status)
            )));
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!(
                    "Token request failed with status {status}: {}",
                    extract_error_message(&body, status)
                ),
            });
        }

        let body: Value = response.json().await.map_err(Error::Http)?;
        parse_token_response(&body)
    }

    /// Drop the cached token so the next request fetches a new one
    pub async fn invalidate(&self) {
        if self.is_refreshable() {
            warn!("Discarding rejected API token");
        }
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Parse `{ "token": "...", "expires": ... }`.
///
/// `expires` may be an RFC 3339 timestamp or epoch milliseconds; a missing
/// or unreadable value leaves the token without expiry.
pub(crate) fn parse_token_response(body: &Value) -> Result<CachedToken> {
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::TokenRefresh {
            message: "token response has no 'token' field".to_string(),
        })?;

    let expires_at = body.get("expires").and_then(parse_expiry);
    Ok(CachedToken::new(token.to_string(), expires_at))
}

fn parse_expiry(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| s.parse::<i64>().ok().and_then(from_epoch_millis)),
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        _ => None,
    }
}

fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
