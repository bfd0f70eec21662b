//! Artifact download with bounded retries.
//!
//! The compressed result is fetched with up to [`MAX_ATTEMPTS`]
//! attempts. A non-success status and a zero-length body are both
//! retryable; attempts are separated by a back-off of
//! [`BACKOFF_BASE_MS`] times the attempt number, and exhausting every
//! attempt surfaces the most recent error. The transport and the
//! back-off timer are seams so the loop can be driven natively in
//! tests.

use crate::http::{self, FetchError};

/// Maximum download attempts before the last error becomes fatal.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base back-off in milliseconds; attempt `n` is followed by a wait of
/// `n` times this.
pub const BACKOFF_BASE_MS: u32 = 500;

/// Delay following failed attempt `attempt`.
#[must_use]
pub const fn backoff_delay_ms(attempt: u32) -> u32 {
    BACKOFF_BASE_MS * attempt
}

/// Byte-fetching seam for the retry loop.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Fetch `url`, returning the body bytes on a success status.
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Waiting seam for the retry loop.
#[allow(async_fn_in_trait)]
pub trait Backoff {
    /// Wait out the delay that follows failed attempt `attempt`.
    async fn wait(&self, attempt: u32);
}

/// Browser fetch transport.
pub struct FetchTransport;

impl Transport for FetchTransport {
    #[allow(clippy::future_not_send)]
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = http::get(url).await?;
        if !response.ok() {
            return Err(FetchError::Status {
                status: response.status(),
                detail: response.status_text(),
            });
        }
        http::response_bytes(&response).await
    }
}

/// Timer-based back-off.
pub struct TimerBackoff;

impl Backoff for TimerBackoff {
    async fn wait(&self, attempt: u32) {
        gloo_timers::future::TimeoutFuture::new(backoff_delay_ms(attempt)).await;
    }
}

/// Download `url`, retrying transient failures.
///
/// `on_retry` is invoked with the failed attempt number before each
/// back-off so the caller can surface partial progress.
///
/// # Errors
///
/// Returns the most recent [`FetchError`] once every attempt has
/// failed.
#[allow(clippy::future_not_send)]
pub async fn download_with_retry<T: Transport, B: Backoff>(
    transport: &T,
    backoff: &B,
    url: &str,
    mut on_retry: impl FnMut(u32),
) -> Result<Vec<u8>, FetchError> {
    let mut last_error = FetchError::EmptyBody;
    for attempt in 1..=MAX_ATTEMPTS {
        match transport.get(url).await {
            Ok(bytes) if bytes.is_empty() => last_error = FetchError::EmptyBody,
            Ok(bytes) => return Ok(bytes),
            Err(e) => last_error = e,
        }
        if attempt < MAX_ATTEMPTS {
            on_retry(attempt);
            backoff.wait(attempt).await;
        }
    }
    Err(last_error)
}
