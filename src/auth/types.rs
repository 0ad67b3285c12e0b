//! Auth configuration types

use chrono::{DateTime, Utc};

/// Scheme prefix sent with server-issued tokens
pub const DEFAULT_TOKEN_SCHEME: &str = "Bearer";

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic credentials on every request
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Fixed bearer token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Token fetched from the server's token endpoint with Basic credentials
    Token {
        /// Absolute URL of the token endpoint
        token_url: String,
        /// Username
        username: String,
        /// Password
        password: String,
        /// Authorization scheme the token is sent with
        scheme: String,
    },
}

impl AuthConfig {
    /// Token flow against `token_url` with the default scheme
    pub fn token(
        token_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        AuthConfig::Token {
            token_url: token_url.into(),
            username: username.into(),
            password: password.into(),
            scheme: DEFAULT_TOKEN_SCHEME.to_string(),
        }
    }

    /// Short name of the auth type, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Token { .. } => "token",
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            AuthConfig::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            AuthConfig::Token {
                token_url,
                username,
                scheme,
                ..
            } => f
                .debug_struct("Token")
                .field("token_url", token_url)
                .field("username", username)
                .field("password", &"***")
                .field("scheme", scheme)
                .finish(),
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_cached_token_not_expired() {
        let token = CachedToken::expires_in("test".to_string(), 3600);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_cached_token_within_buffer_is_expired() {
        let token = CachedToken::expires_in("test".to_string(), 10);
        assert!(token.is_expired());
    }

    #[test]
    fn test_cached_token_no_expiration() {
        let token = CachedToken::new("test".to_string(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(matches!(config, AuthConfig::None));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = AuthConfig::token("https://jss/api/v1/auth/token", "admin", "hunter2");
        let printed = format!("{config:?}");
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
        assert_eq!(config.kind(), "token");
    }
}
