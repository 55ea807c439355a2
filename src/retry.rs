//! Retry logic with exponential backoff
//!
//! This module provides capped, jittered retry loops that stop as soon as the
//! caller's [`CancellationToken`] fires. Two flavours exist:
//! - [`with_retry`] retries whatever [`IsRetryable`] classifies as transient
//! - [`retry_if`] retries on a caller-supplied predicate, used for the
//!   invalid-identifier loop of anonymous session bootstrap
//!
//! # Example
//!
//! ```no_run
//! use folio_dl::config::RetryConfig;
//! use folio_dl::error::Error;
//! use folio_dl::retry::retry_if;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let cancel = CancellationToken::new();
//! let value = retry_if(&config, &cancel, Error::is_invalid_identifier, || async {
//!     Ok::<_, Error>(42)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, server busy, connection reset) should return `true`.
/// Permanent failures (bad credentials, missing pages, decryption) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            Error::Http { status, .. } => *status >= 500 || *status == 429,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Server-reported, data-integrity, decryption and configuration errors
            // do not change on a second try
            Error::Config { .. }
            | Error::MissingCredentials
            | Error::Api { .. }
            | Error::Protocol { .. }
            | Error::InvalidIssueNumber { .. }
            | Error::IssueNotFound { .. }
            | Error::Archive(_)
            | Error::Decryption { .. }
            | Error::ExternalTool(_)
            | Error::NotSupported(_)
            | Error::Serialization(_)
            | Error::Cancelled
            | Error::Timeout { .. } => false,
        }
    }
}

/// Execute an async operation, retrying errors classified as transient
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_if(config, cancel, Error::is_retryable, operation).await
}

/// Execute an async operation, retrying while `should_retry` accepts the error
///
/// At most `config.max_attempts` retries follow the first attempt. Delays grow by
/// `backoff_multiplier` up to `max_delay`, with optional jitter. Cancellation is
/// checked before every attempt and interrupts any pending delay.
pub async fn retry_if<F, Fut, T, P>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    should_retry: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if should_retry(&e) && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                sleep_or_cancel(cancel, jittered_delay).await?;

                delay = next_delay(delay, config.backoff_multiplier, config.max_delay);
            }
            Err(e) => {
                if should_retry(&e) {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Sleep for `duration`, returning `Error::Cancelled` if the token fires first
pub async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Grow `delay` by `multiplier`, capped at `max`
pub(crate) fn next_delay(delay: Duration, multiplier: f64, max: Duration) -> Duration {
    Duration::from_secs_f64(delay.as_secs_f64() * multiplier).min(max)
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
