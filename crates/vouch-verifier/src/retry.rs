//! Bounded retries for idempotent registry reads.
//!
//! Only errors the registry marks retryable (infrastructure failures and
//! timeouts) are retried. Writes never go through here.

use std::future::Future;
use std::time::Duration;

use vouch_registry::RegistryError;

/// Run `f` up to `max_retries + 1` times, doubling the delay after each
/// retryable failure: `base`, `2 * base`, `4 * base`, ...
pub(crate) async fn retry_read<T, F, Fut>(
    operation: &str,
    max_retries: u32,
    base_delay: Duration,
    f: F,
) -> Result<T, RegistryError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RegistryError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                attempt += 1;
                tracing::warn!(
                    operation,
                    attempt,
                    max_retries,
                    "registry read failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
