//! Configuration management for Tollgate.
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! `TOLLGATE_*` environment variables (`__` separates nested keys, e.g.
//! `TOLLGATE_RATE_LIMITING__LIMIT=50`). A bare `PORT` variable overrides the
//! bind port last.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, TollgateError};
use crate::ratelimit::{LimiterConfig, MAX_SWEEP_INTERVAL};

/// Main configuration for the Tollgate service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// How long in-flight requests may drain after a shutdown signal
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_shutdown_grace() -> u64 {
    30
}

/// Rate limiting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Whether the middleware consults the limiter at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Length of a client's window in seconds
    #[serde(default = "default_window")]
    pub window_secs: u64,

    /// Admitted requests per client per window
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Seconds between eviction sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            window_secs: default_window(),
            limit: default_limit(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_window() -> u64 {
    60
}

fn default_limit() -> u32 {
    100
}

fn default_sweep_interval() -> u64 {
    60
}

impl RateLimitingConfig {
    /// Limiter tunables described by this section.
    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig::default()
            .with_window(Duration::from_secs(self.window_secs))
            .with_limit(self.limit)
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
    }
}

impl ServiceConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_port(path, std::env::var("PORT").ok())
    }

    fn load_with_port(path: Option<&Path>, port: Option<String>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("TOLLGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: ServiceConfig = settings.try_deserialize()?;

        if let Some(port) = port {
            config.apply_port(&port)?;
        }

        config.validate()?;
        debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Override the bind port with a value taken from the environment.
    fn apply_port(&mut self, port: &str) -> Result<()> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| TollgateError::Config(format!("PORT is not a valid port: {port:?}")))?;
        self.server.bind_addr.set_port(port);
        Ok(())
    }

    /// Reject values the limiter cannot work with.
    pub fn validate(&self) -> Result<()> {
        let rl = &self.rate_limiting;

        if rl.limit == 0 {
            return Err(TollgateError::Config(
                "rate_limiting.limit must be greater than 0".into(),
            ));
        }

        if rl.window_secs == 0 {
            return Err(TollgateError::Config(
                "rate_limiting.window_secs must be greater than 0".into(),
            ));
        }

        if rl.sweep_interval_secs == 0 {
            return Err(TollgateError::Config(
                "rate_limiting.sweep_interval_secs must be greater than 0".into(),
            ));
        }

        if rl.sweep_interval_secs > MAX_SWEEP_INTERVAL.as_secs() {
            return Err(TollgateError::Config(format!(
                "rate_limiting.sweep_interval_secs must be at most {}",
                MAX_SWEEP_INTERVAL.as_secs()
            )));
        }

        Ok(())
    }
}
