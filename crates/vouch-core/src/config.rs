use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the verification engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for a single DID resolution, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub resolve_timeout_ms: u64,
    /// Upper bound for a single status lookup, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub status_timeout_ms: u64,
    /// Retries after the first attempt for idempotent registry reads.
    #[serde(default = "default_max_read_retries")]
    pub max_read_retries: u32,
    /// Base backoff delay, doubled on every retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Treat an invalid proof as an error rather than a warning.
    #[serde(default = "default_strict_proofs")]
    pub strict_proofs: bool,
}

fn default_timeout_ms() -> u64 {
    2_000
}
fn default_max_read_retries() -> u32 {
    2
}
fn default_retry_base_delay_ms() -> u64 {
    100
}
fn default_strict_proofs() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: default_timeout_ms(),
            status_timeout_ms: default_timeout_ms(),
            max_read_retries: default_max_read_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            strict_proofs: default_strict_proofs(),
        }
    }
}

impl EngineConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
