//! Configuration types for the hubsync pipeline
//!
//! This is the *resolved* configuration record the orchestrator consumes.
//! How the values are gathered (flags, environment, config file) is the
//! daemon's concern; by the time a `SyncConfig` reaches the core it is
//! immutable for the process lifetime. `validate()` is the fail-fast gate:
//! it runs once, before the scheduler starts, never per cycle.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved hubsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Gateway (router) connection settings
    pub gateway: GatewayConfig,

    /// DNS provider account and record settings
    pub provider: ProviderConfig,

    /// Retry behavior for failed cycles
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Minutes between cycle triggers
    #[serde(default = "default_poll_interval_mins")]
    pub poll_interval_mins: u64,

    /// HTTP timeout in seconds, applied to gateway and provider requests
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Validate the configuration
    ///
    /// A missing required credential is a startup-fatal configuration error,
    /// not something the retry machinery ever sees.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.gateway.validate()?;
        self.provider.validate()?;

        if self.poll_interval_mins == 0 {
            return Err(crate::Error::config("poll interval must be at least 1 minute"));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be at least 1 second"));
        }

        Ok(())
    }

    /// Interval between scheduled cycle triggers
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_mins * 60)
    }

    /// Timeout applied to every gateway and provider HTTP request
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            provider: ProviderConfig::default(),
            retry: RetryPolicy::default(),
            poll_interval_mins: default_poll_interval_mins(),
            http_timeout_secs: default_http_timeout_secs(),
            engine: EngineConfig::default(),
        }
    }
}

/// Gateway (router) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address of the gateway's web management interface
    #[serde(default = "default_gateway_address")]
    pub address: String,

    /// Admin password for the web management interface (required)
    #[serde(default)]
    pub password: String,
}

impl GatewayConfig {
    /// Validate the gateway settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.address.is_empty() {
            return Err(crate::Error::config("gateway address cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("gateway admin password is required"));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: default_gateway_address(),
            password: String::new(),
        }
    }
}

/// DNS provider account and record settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Hostname whose record gets updated (required)
    #[serde(default)]
    pub hostname: String,

    /// Provider account username (required)
    #[serde(default)]
    pub username: String,

    /// Provider account password (required)
    #[serde(default)]
    pub password: String,

    /// Override the provider implementation's default update endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    /// Validate the provider settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hostname.is_empty() {
            return Err(crate::Error::config("DNS hostname is required"));
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("DNS provider username is required"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("DNS provider password is required"));
        }
        Ok(())
    }
}

/// Retry behavior for failed cycles
///
/// A failed pipeline step hands control back to the orchestrator, which
/// re-runs the *whole* pipeline up to `max_retries` extra times per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Whether failed cycles are retried at all
    #[serde(default)]
    pub enabled: bool,

    /// Extra pipeline attempts after the initial one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to wait between attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl RetryPolicy {
    /// Pause between pipeline attempts
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the cycle-event channel
    ///
    /// When full, new events are dropped (with a warning log) rather than
    /// blocking the pipeline.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_gateway_address() -> String {
    "192.168.0.1".to_string()
}

fn default_poll_interval_mins() -> u64 {
    5
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    100
}
