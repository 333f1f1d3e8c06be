//! Configuration for Nixie
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for Nixie
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NixieConfig {
    /// Acknowledgement aggregation configuration
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Acknowledgement forwarder configuration
    #[serde(default)]
    pub forwarder: ForwarderConfig,
}

impl NixieConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.aggregation.validate()?;
        self.forwarder.validate()?;
        Ok(())
    }
}

/// Acknowledgement aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Timeout applied when a signal carries no explicit timeout (milliseconds)
    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_timeout_ms: u64,

    /// Depth of each session's event mailbox
    #[serde(default = "default_mailbox_depth")]
    pub mailbox_depth: usize,

    /// Maximum concurrently in-flight aggregation sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions_count: usize,
}

fn default_fallback_timeout_ms() -> u64 {
    AGGREGATION_TIMEOUT_MS_DEFAULT
}

fn default_mailbox_depth() -> usize {
    SESSION_MAILBOX_DEPTH_DEFAULT
}

fn default_max_sessions() -> usize {
    100_000
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            fallback_timeout_ms: default_fallback_timeout_ms(),
            mailbox_depth: default_mailbox_depth(),
            max_sessions_count: default_max_sessions(),
        }
    }
}

impl AggregationConfig {
    fn validate(&self) -> Result<()> {
        if self.fallback_timeout_ms == 0 {
            return Err(Error::InvalidConfiguration {
                field: "aggregation.fallback_timeout_ms".into(),
                reason: "must be positive".into(),
            });
        }

        if self.fallback_timeout_ms > AGGREGATION_TIMEOUT_MS_MAX {
            return Err(Error::InvalidConfiguration {
                field: "aggregation.fallback_timeout_ms".into(),
                reason: format!(
                    "{} exceeds limit {}",
                    self.fallback_timeout_ms, AGGREGATION_TIMEOUT_MS_MAX
                ),
            });
        }

        if self.mailbox_depth == 0 || self.mailbox_depth > SESSION_MAILBOX_DEPTH_MAX {
            return Err(Error::InvalidConfiguration {
                field: "aggregation.mailbox_depth".into(),
                reason: format!("must be in 1..={}", SESSION_MAILBOX_DEPTH_MAX),
            });
        }

        if self.max_sessions_count == 0 || self.max_sessions_count > SESSIONS_CONCURRENT_COUNT_MAX {
            return Err(Error::InvalidConfiguration {
                field: "aggregation.max_sessions_count".into(),
                reason: format!("must be in 1..={}", SESSIONS_CONCURRENT_COUNT_MAX),
            });
        }

        Ok(())
    }
}

/// Acknowledgement forwarder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Fixed lifetime of a forwarder relay (milliseconds)
    ///
    /// Must exceed the maximum aggregation timeout: the session owns the
    /// authoritative deadline, the forwarder only needs to outlive it.
    #[serde(default = "default_forwarder_lifetime_ms")]
    pub lifetime_ms: u64,
}

fn default_forwarder_lifetime_ms() -> u64 {
    FORWARDER_LIFETIME_MS_DEFAULT
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: default_forwarder_lifetime_ms(),
        }
    }
}

impl ForwarderConfig {
    fn validate(&self) -> Result<()> {
        if self.lifetime_ms <= AGGREGATION_TIMEOUT_MS_MAX {
            return Err(Error::InvalidConfiguration {
                field: "forwarder.lifetime_ms".into(),
                reason: format!(
                    "must be greater than the maximum aggregation timeout {}",
                    AGGREGATION_TIMEOUT_MS_MAX
                ),
            });
        }

        if self.lifetime_ms > FORWARDER_LIFETIME_MS_MAX {
            return Err(Error::InvalidConfiguration {
                field: "forwarder.lifetime_ms".into(),
                reason: format!("{} exceeds limit {}", self.lifetime_ms, FORWARDER_LIFETIME_MS_MAX),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NixieConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_fallback_timeout_rejected() {
        let mut config = NixieConfig::default();
        config.aggregation.fallback_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forwarder_must_outlive_sessions() {
        let mut config = NixieConfig::default();
        config.forwarder.lifetime_ms = AGGREGATION_TIMEOUT_MS_MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mailbox_depth_bounds() {
        let mut config = NixieConfig::default();
        config.aggregation.mailbox_depth = SESSION_MAILBOX_DEPTH_MAX + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: NixieConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(
            config.aggregation.fallback_timeout_ms,
            AGGREGATION_TIMEOUT_MS_DEFAULT
        );
        assert_eq!(config.forwarder.lifetime_ms, FORWARDER_LIFETIME_MS_DEFAULT);
    }
}
