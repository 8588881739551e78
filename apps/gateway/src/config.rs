//! Configuration for the gateway

use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse, server::ServerConfig,
};
use std::time::Duration;

pub use core_config::Environment;

/// Where and how requests are forwarded
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    /// Base URL of the products backend, e.g. `http://products-api:3000`
    pub backend_url: String,
    pub timeout: Duration,
    /// Cap for inbound request bodies and buffered upstream responses
    pub max_body_bytes: usize,
}

impl UpstreamConfig {
    pub const DEFAULT_BACKEND_URL: &'static str = "http://localhost:3000";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            backend_url: Self::DEFAULT_BACKEND_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// - `BACKEND_URL` (default `http://localhost:3000`)
/// - `UPSTREAM_TIMEOUT_SECS` (default 30)
/// - `MAX_BODY_BYTES` (default 52428800)
impl FromEnv for UpstreamConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            backend_url: env_or_default("BACKEND_URL", Self::DEFAULT_BACKEND_URL),
            timeout: Duration::from_secs(env_parse(
                "UPSTREAM_TIMEOUT_SECS",
                Self::DEFAULT_TIMEOUT_SECS,
            )?),
            max_body_bytes: env_parse("MAX_BODY_BYTES", Self::DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

/// Port used when `PORT` is unset
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub upstream: UpstreamConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            server: ServerConfig::from_env_with_port(DEFAULT_PORT)?,
            environment: Environment::from_env(),
            upstream: UpstreamConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_config_defaults() {
        temp_env::with_vars(
            [
                ("BACKEND_URL", None::<&str>),
                ("UPSTREAM_TIMEOUT_SECS", None),
                ("MAX_BODY_BYTES", None),
            ],
            || {
                let config = UpstreamConfig::from_env().unwrap();
                assert_eq!(config.backend_url, "http://localhost:3000");
                assert_eq!(config.timeout, Duration::from_secs(30));
                assert_eq!(config.max_body_bytes, 52_428_800);
            },
        );
    }

    #[test]
    fn test_upstream_config_from_env() {
        temp_env::with_vars(
            [
                ("BACKEND_URL", Some("http://products-api:3000")),
                ("UPSTREAM_TIMEOUT_SECS", Some("5")),
                ("MAX_BODY_BYTES", Some("1024")),
            ],
            || {
                let config = UpstreamConfig::from_env().unwrap();
                assert_eq!(config.backend_url, "http://products-api:3000");
                assert_eq!(config.timeout, Duration::from_secs(5));
                assert_eq!(config.max_body_bytes, 1024);
            },
        );
    }

    #[test]
    fn test_upstream_config_rejects_bad_timeout() {
        temp_env::with_var("UPSTREAM_TIMEOUT_SECS", Some("soon"), || {
            let err = UpstreamConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("UPSTREAM_TIMEOUT_SECS"));
        });
    }

    #[test]
    fn test_config_default_port() {
        temp_env::with_vars([("PORT", None::<&str>), ("HOST", None)], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.app.name, "gateway");
        });
    }
}
