// Retry logic with exponential backoff

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::WorldSimError;

const BASE_DELAY_MS: u64 = 1000;

/// Execute a function with exponential backoff retry logic
///
/// `max_attempts` counts the first call; 1 disables retrying. Errors that
/// cannot succeed on a second try (bad request, auth) return immediately.
pub async fn with_retry<F, Fut, T>(max_attempts: u32, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;

                if attempt >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }

                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt - 1));
                tracing::warn!(
                    "Request failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    max_attempts,
                    delay,
                    e
                );
                sleep(delay).await;
            }
        }
    }
}

fn is_retryable(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<WorldSimError>() {
        Some(e) => e.is_retryable(),
        // Transport failures (timeouts, resets) are worth another try
        None => true,
    }
}
