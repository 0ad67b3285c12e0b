//! Client configuration
//!
//! Loaded from a YAML file, by default `~/.config/jss-client/config.yaml`:
//!
//! ```yaml
//! url: https://jss.example.com:8443
//! username: api-user
//! password: secret
//! auth: token
//! max_age_seconds: 600
//! repos:
//!   - type: mounted
//!     name: CasperShare
//!     path: /Volumes/CasperShare
//! ```
//!
//! `JSS_URL`, `JSS_USERNAME`, `JSS_PASSWORD` and `JSS_VERIFY_TLS` override
//! the file.

use crate::auth::AuthConfig;
use crate::distribution::RepoConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// How the client authenticates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// HTTP Basic on every request
    #[default]
    Basic,
    /// Bearer token from the token endpoint
    Token,
}

/// Connection settings for one server
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://jss.example.com:8443`
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Verify the server certificate
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    #[serde(default)]
    pub auth: AuthMode,

    /// Token endpoint relative to `url`
    #[serde(default = "default_token_path")]
    pub token_path: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Age after which fetched records are stale; negative never expires
    #[serde(default = "default_max_age")]
    pub max_age_seconds: i64,

    /// Records fetched at once when resolving a listing
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Distribution points
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

fn default_true() -> bool {
    true
}

fn default_token_path() -> String {
    "api/v1/auth/token".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_age() -> i64 {
    3600
}

fn default_resolve_concurrency() -> usize {
    3
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            verify_tls: default_true(),
            auth: AuthMode::default(),
            token_path: default_token_path(),
            timeout_seconds: default_timeout(),
            max_age_seconds: default_max_age(),
            resolve_concurrency: default_resolve_concurrency(),
            user_agent: None,
            repos: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Settings for a server with basic credentials
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Location of the config file when none is given
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("jss-client").join("config.yaml"))
    }

    /// Load a YAML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;

        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse YAML without touching the environment
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `JSS_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("JSS_URL") {
            self.url = url;
        }
        if let Some(username) = lookup("JSS_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("JSS_PASSWORD") {
            self.password = password;
        }
        if let Some(verify) = lookup("JSS_VERIFY_TLS") {
            self.verify_tls = !matches!(
                verify.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
    }

    /// Check required fields and ranges
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::missing_field("url"));
        }
        let parsed = Url::parse(&self.url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "url must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.username.is_empty() {
            return Err(Error::missing_field("username"));
        }
        if self.password.is_empty() {
            return Err(Error::missing_field("password"));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::config("timeout_seconds must be greater than zero"));
        }
        if self.resolve_concurrency == 0 {
            return Err(Error::config("resolve_concurrency must be greater than zero"));
        }
        Ok(())
    }

    /// Authentication for the HTTP client
    pub fn auth_config(&self) -> AuthConfig {
        match self.auth {
            AuthMode::Basic => AuthConfig::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            AuthMode::Token => AuthConfig::token(
                format!(
                    "{}/{}",
                    self.url.trim_end_matches('/'),
                    self.token_path.trim_start_matches('/')
                ),
                &self.username,
                &self.password,
            ),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("verify_tls", &self.verify_tls)
            .field("auth", &self.auth)
            .field("token_path", &self.token_path)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_age_seconds", &self.max_age_seconds)
            .field("resolve_concurrency", &self.resolve_concurrency)
            .field("user_agent", &self.user_agent)
            .field("repos", &self.repos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;
    use test_case::test_case;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
url: "https://jss.example.com:8443"
username: api
password: secret
"#;

        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.url, "https://jss.example.com:8443");
        assert!(config.verify_tls);
        assert_eq!(config.auth, AuthMode::Basic);
        assert_eq!(config.token_path, "api/v1/auth/token");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_age_seconds, 3600);
        assert_eq!(config.resolve_concurrency, 3);
        assert!(config.repos.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
url: "https://jss.example.com:8443/"
username: api
password: secret
verify_tls: false
auth: token
max_age_seconds: -1
resolve_concurrency: 8
user_agent: "inventory-sync/1.0"
repos:
  - type: mounted
    name: CasperShare
    path: /Volumes/CasperShare
"#;

        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.verify_tls);
        assert_eq!(config.max_age_seconds, -1);
        assert_eq!(config.repos.len(), 1);

        match config.auth_config() {
            AuthConfig::Token { token_url, .. } => {
                assert_eq!(token_url, "https://jss.example.com:8443/api/v1/auth/token");
            }
            other => panic!("Expected token auth, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_auth_config() {
        let config = ClientConfig::new("https://jss.example.com", "api", "secret");
        assert_eq!(config.auth_config().kind(), "basic");
    }

    #[test_case("", "api", "secret", "url" ; "missing url")]
    #[test_case("https://jss.example.com", "", "secret", "username" ; "missing username")]
    #[test_case("https://jss.example.com", "api", "", "password" ; "missing password")]
    fn test_validate_missing_fields(url: &str, username: &str, password: &str, field: &str) {
        let err = ClientConfig::new(url, username, password).validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field: ref f } if f == field));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig::new("ftp://jss.example.com", "api", "secret");
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = ClientConfig::new("not a url", "api", "secret");
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));

        let mut config = ClientConfig::new("https://jss.example.com", "api", "secret");
        config.resolve_concurrency = 0;
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("JSS_URL", "https://override.example.com"),
            ("JSS_PASSWORD", "from-env"),
            ("JSS_VERIFY_TLS", "False"),
        ]);

        let mut config = ClientConfig::new("https://jss.example.com", "api", "secret");
        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.url, "https://override.example.com");
        assert_eq!(config.username, "api");
        assert_eq!(config.password, "from-env");
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_debug_masks_password() {
        let config = ClientConfig::new("https://jss.example.com", "api", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "url: https://jss.example.com\nusername: api\npassword: x\n").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.username, "api");

        assert!(matches!(
            ClientConfig::load(dir.path().join("missing.yaml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = ClientConfig::default_path() {
            assert!(path.ends_with("jss-client/config.yaml"));
        }
    }
}
