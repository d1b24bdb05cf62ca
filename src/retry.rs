use std::future::Future;
use std::time::Duration;

/// Retry decision returned by the error classifier callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry,
    Abort,
}

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            delay: Duration::from_secs(1),
        }
    }
}

/// Retry an async operation with a fixed pause between attempts.
///
/// - `config`: retry configuration
/// - `classifier`: inspects an error and returns `Retry` or `Abort`
/// - `operation`: the async closure to retry, called with the 0-indexed attempt
///
/// Returns the first `Ok` result, or the last error if retries are exhausted
/// or the classifier returns `Abort`.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    config: &RetryConfig,
    classifier: C,
    operation: F,
) -> Result<T, E>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryAction,
    E: std::fmt::Display,
{
    let total_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if classifier(&e) == RetryAction::Abort || attempt + 1 >= total_attempts {
                    return Err(e);
                }
                tracing::warn!(
                    "Retryable error (attempt {}/{}), retrying in {}ms: {}",
                    attempt + 1,
                    total_attempts,
                    config.delay.as_millis(),
                    e
                );
                tokio::time::sleep(config.delay).await;
                attempt += 1;
            }
        }
    }
}
