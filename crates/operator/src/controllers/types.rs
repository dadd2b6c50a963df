//! Shared controller types: error taxonomy and reconcile context.

use crate::config::OperatorConfig;
use crate::trigger::TriggerBus;
use dashmap::DashMap;
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Object has no namespace")]
    MissingNamespace,

    #[error("Object has no name")]
    MissingObjectKey,

    #[error("Trigger bus closed before trigger could be published")]
    TriggerBusClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Shared context passed to both reconcilers
pub struct Context {
    pub client: Client,
    pub config: Arc<OperatorConfig>,
    pub bus: TriggerBus,
    pub retries: RetryTracker,
}

impl Context {
    pub fn new(client: Client, config: Arc<OperatorConfig>, bus: TriggerBus) -> Self {
        Self {
            client,
            config,
            bus,
            retries: RetryTracker::default(),
        }
    }
}

/// Longest delay the error policies will back off to
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Consecutive-failure bookkeeping per object key, driving the exponential
/// backoff of the error policies. Retry counts are unbounded; only the delay
/// is capped.
#[derive(Default)]
pub struct RetryTracker {
    failures: DashMap<String, u32>,
}

impl RetryTracker {
    /// Record a failure for `key` and return the delay before the next
    /// attempt: 1s, doubling per consecutive failure.
    pub fn next_backoff(&self, key: &str) -> Duration {
        let mut failures = self.failures.entry(key.to_string()).or_insert(0);
        *failures = failures.saturating_add(1);
        let exp = failures.saturating_sub(1).min(16);
        Duration::from_secs(1u64 << exp).min(MAX_BACKOFF)
    }

    /// Reset the failure count for `key` after a successful reconcile.
    pub fn clear(&self, key: &str) {
        self.failures.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_consecutive_failure() {
        let retries = RetryTracker::default();
        assert_eq!(retries.next_backoff("ns1"), Duration::from_secs(1));
        assert_eq!(retries.next_backoff("ns1"), Duration::from_secs(2));
        assert_eq!(retries.next_backoff("ns1"), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_is_per_key() {
        let retries = RetryTracker::default();
        retries.next_backoff("ns1");
        retries.next_backoff("ns1");
        assert_eq!(retries.next_backoff("ns2"), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let retries = RetryTracker::default();
        for _ in 0..40 {
            retries.next_backoff("ns1");
        }
        assert_eq!(retries.next_backoff("ns1"), MAX_BACKOFF);
    }

    #[test]
    fn test_success_resets_backoff() {
        let retries = RetryTracker::default();
        retries.next_backoff("ns1");
        retries.next_backoff("ns1");
        retries.clear("ns1");
        assert_eq!(retries.next_backoff("ns1"), Duration::from_secs(1));
    }
}
