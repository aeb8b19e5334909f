//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Runtime settings for the session server.
///
/// Every field has a default, so a config file only needs the values it
/// overrides. The signing secret has no usable default and must be supplied
/// by file, flag or environment before [`validate`](Self::validate) passes.
#[derive(Clone, Getters, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    host: String,

    /// Port to bind.
    port: u16,

    /// Number of game slots allocated at startup.
    pool_size: usize,

    /// Depth of each connection's outbound queue.
    outbound_capacity: usize,

    /// Identity token lifetime, in seconds.
    token_ttl_secs: u64,

    /// HMAC secret for identity tokens.
    signing_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            pool_size: 100,
            outbound_capacity: 32,
            token_ttl_secs: 24 * 60 * 60,
            signing_secret: String::new(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("pool_size", &self.pool_size)
            .field("outbound_capacity", &self.outbound_capacity)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("signing_secret", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(pool_size = config.pool_size, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Overrides the signing secret.
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = secret.into();
        self
    }

    /// Token lifetime as a [`Duration`].
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// `host:port`, ready for a listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::new(
                "signing secret is empty; pass --secret or set ULTIMATE_SIGNING_SECRET".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::new("pool_size must be at least 1".to_string()));
        }
        if self.outbound_capacity == 0 {
            return Err(ConfigError::new("outbound_capacity must be at least 1".to_string()));
        }
        if self.token_ttl_secs == 0 {
            return Err(ConfigError::new("token_ttl_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.port(), 3000);
        assert_eq!(*config.pool_size(), 100);
        assert_eq!(*config.outbound_capacity(), 32);
        assert_eq!(config.token_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4100\npool_size = 8\nsigning_secret = \"s3cret\"").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(*config.port(), 4100);
        assert_eq!(*config.pool_size(), 8);
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.outbound_capacity(), 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::from_file("/nonexistent/ultimate.toml").unwrap_err();
        assert!(err.message.starts_with("Failed to read config file"));
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn test_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(err.message.starts_with("Failed to parse config"));
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        assert!(ServerConfig::default().validate().is_err());

        let ok = ServerConfig::default().with_signing_secret("k");
        assert!(ok.validate().is_ok());
        assert!(ok.clone().with_pool_size(0).validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ServerConfig::default().with_signing_secret("hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
