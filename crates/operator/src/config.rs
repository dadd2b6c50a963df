//! Operator configuration
//!
//! Loaded from a mounted YAML file with defaults for every field, so the
//! operator also runs with no config file at all. The blacklist is injected
//! into the admission gate at construction time; nothing reads it through
//! global state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Main operator configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperatorConfig {
    /// Label keys that `NamespaceLabel` objects may not use
    #[serde(default = "default_blacklist")]
    pub blacklist: BTreeSet<String>,

    /// Capacity of the in-process trigger bus; publishers block when full
    #[serde(default = "default_trigger_capacity", rename = "triggerCapacity")]
    pub trigger_capacity: usize,

    /// Requeue delay after a benign optimistic-concurrency conflict
    #[serde(
        default = "default_conflict_requeue_seconds",
        rename = "conflictRequeueSeconds"
    )]
    pub conflict_requeue_seconds: u64,

    /// Bind address for the admission webhook and health endpoints
    #[serde(default = "default_webhook_addr", rename = "webhookAddr")]
    pub webhook_addr: String,
}

fn default_blacklist() -> BTreeSet<String> {
    ["app", "dana"].iter().map(ToString::to_string).collect()
}

fn default_trigger_capacity() -> usize {
    64
}

fn default_conflict_requeue_seconds() -> u64 {
    1
}

fn default_webhook_addr() -> String {
    "0.0.0.0:8443".to_string()
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            blacklist: default_blacklist(),
            trigger_capacity: default_trigger_capacity(),
            conflict_requeue_seconds: default_conflict_requeue_seconds(),
            webhook_addr: default_webhook_addr(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from a mounted file path
    pub fn from_mounted_file(config_path: &str) -> Result<Self, anyhow::Error> {
        let config_str = std::fs::read_to_string(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {config_path}: {e}"))?;

        let config: OperatorConfig = serde_yaml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {e}"))?;

        Ok(config)
    }

    /// Validate that the configuration is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.trigger_capacity == 0 {
            return Err("triggerCapacity must be greater than zero".to_string());
        }
        if self.webhook_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "webhookAddr {:?} is not a valid socket address",
                self.webhook_addr
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OperatorConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.blacklist.contains("app"));
        assert!(config.blacklist.contains("dana"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: OperatorConfig = serde_yaml::from_str("blacklist: [internal]").unwrap();
        assert_eq!(config.blacklist, ["internal".to_string()].into());
        assert_eq!(config.trigger_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config: OperatorConfig = serde_yaml::from_str("triggerCapacity: 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_webhook_addr_rejected() {
        let config: OperatorConfig =
            serde_yaml::from_str("webhookAddr: not-an-address").unwrap();
        assert!(config.validate().is_err());
    }
}
