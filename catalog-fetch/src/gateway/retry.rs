//! Retry logic for transient gateway failures
//!
//! Implements exponential backoff for network-level failures. Data errors are
//! never retried here: they surface to the caller on the first attempt.

use std::time::Duration;

use catalog_common::config::GatewayConfig;

use crate::error::{CatalogError, Result};

/// Backoff parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Total attempts allowed; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            initial_delay: Duration::from_secs(config.initial_backoff_secs),
            max_delay: Duration::from_secs(config.max_backoff_secs),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Retry an operation while it fails with a transient error
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is transient and attempts remain: log WARN, sleep, double
///    the delay (capped at `max_delay`), retry
/// 4. Otherwise return the error
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    let mut delay = policy.initial_delay.min(policy.max_delay);

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying request");
        }

        let err: CatalogError = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            tracing::error!(
                operation = operation_name,
                attempt,
                error = %err,
                "Request failed: retry attempts exhausted"
            );
            return Err(err);
        }

        tracing::warn!(
            operation = operation_name,
            attempt,
            backoff_ms = delay.as_millis() as u64,
            error = %err,
            "Request failed, will retry after backoff"
        );

        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(policy.max_delay);
    }
}
