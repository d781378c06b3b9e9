//! Bounded retry over transient client errors.
//!
//! Remote hosts are flaky, so a fetch that fails with a transient error is
//! attempted again, back to back, up to [`MAX_ATTEMPTS`] times. Every other
//! error is deterministic and returned on first occurrence.

use std::future::Future;

use crate::{FetchError, Request, Response, Result, TimeoutArg, UrlOpener};

/// Total attempts, including the first one.
pub const MAX_ATTEMPTS: usize = 3;

/// Runs `operation` until it succeeds, fails non-transiently, or has been
/// attempted [`MAX_ATTEMPTS`] times.
///
/// On exhaustion the last transient error is returned as is.
pub async fn retry_transient<T, F, Fut>(mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error: Option<FetchError> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    error = %err,
                    "transient fetch error"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = attempt;
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    // MAX_ATTEMPTS > 0, so reaching this point means every attempt stored an error.
    Err(last_error.unwrap_or_else(|| FetchError::Transient {
        url: String::new(),
        message: "no attempt was made".to_owned(),
    }))
}

/// Opens `request` through `client`, retrying transient failures.
pub async fn open_with_retry<C>(
    client: &C,
    request: &Request,
    timeout: TimeoutArg,
) -> Result<Box<dyn Response>>
where
    C: UrlOpener + ?Sized,
{
    retry_transient(|| client.open(request, timeout)).await
}
