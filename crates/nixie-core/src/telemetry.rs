//! Telemetry infrastructure
//!
//! Tracing subscriber setup shared by binaries and integration tests.

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name included in log output
    pub service_name: String,
    /// Log level filter (overridden by RUST_LOG when set)
    pub log_level: String,
    /// Whether to include tracing span targets in output
    pub targets_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "nixie".to_string(),
            log_level: "info".to_string(),
            targets_enabled: false,
        }
    }
}

impl TelemetryConfig {
    /// Create a new configuration with the given service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Include tracing span targets in output
    pub fn with_targets(mut self) -> Self {
        self.targets_enabled = true;
        self
    }

    /// Create from environment variables
    ///
    /// Reads `NIXIE_SERVICE_NAME` and `RUST_LOG`.
    pub fn from_env() -> Self {
        let service_name =
            std::env::var("NIXIE_SERVICE_NAME").unwrap_or_else(|_| "nixie".to_string());
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            service_name,
            log_level,
            targets_enabled: false,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// Returns an error if a subscriber was already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.targets_enabled)
        .try_init()
        .map_err(|e| Error::Internal {
            reason: format!("failed to install tracing subscriber: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "nixie");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_builder() {
        let config = TelemetryConfig::new("ack-service").with_log_level("debug").with_targets();
        assert_eq!(config.service_name, "ack-service");
        assert_eq!(config.log_level, "debug");
        assert!(config.targets_enabled);
    }
}
