//! Configuration loading from bucketgate.toml.

use serde::Deserialize;
use session::Credentials;
use std::path::Path;
use std::time::Duration;

const ACCESS_KEY_ENV: &str = "BUCKETGATE_ACCESS_KEY";
const SECRET_KEY_ENV: &str = "BUCKETGATE_SECRET_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Console server connection.
    #[serde(default)]
    pub server: ServerConfig,

    /// Sign-in credentials. Environment variables take precedence.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Console server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the console server.
    #[serde(default = "default_url")]
    pub url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

fn default_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Build credentials from the environment, falling back to the file.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.credentials_with(|key| std::env::var(key).ok())
    }

    /// Requires both keys once `env` overrides are applied.
    fn credentials_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, ConfigError> {
        let access = env(ACCESS_KEY_ENV).or_else(|| self.credentials.access_key.clone());
        let secret = env(SECRET_KEY_ENV).or_else(|| self.credentials.secret_key.clone());
        match (access, secret) {
            (Some(access), Some(secret)) => Ok(Credentials::new(access, secret)),
            (None, None) => Err(ConfigError::MissingCredentials),
            _ => Err(ConfigError::IncompleteCredentials),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(
        "credentials not configured: set credentials.access_key and credentials.secret_key \
         or BUCKETGATE_ACCESS_KEY and BUCKETGATE_SECRET_KEY"
    )]
    MissingCredentials,

    #[error("incomplete credentials: both an access key and a secret key are required")]
    IncompleteCredentials,
}
