//! Transport Layer
//!
//! Retry-safe HTTP exchange shared by the GitHub client and the InfluxDB
//! publisher.
//!
//! # Components
//!
//! - [`HttpSend`]: the raw request/response exchange being decorated
//! - [`RetryingClient`]: re-issues requests on transient failures with
//!   exponential backoff
//! - [`RetryPolicy`]: retry ceiling and backoff base
//! - [`build_http_client`]: the shared `reqwest::Client` with timeouts

mod retry;

pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, HttpSend, RETRYABLE_STATUSES, RetryPolicy,
    RetryingClient, TransportError, is_retryable_status, should_retry,
};

use std::time::Duration;

/// `User-Agent` sent with every outbound request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for all outbound calls.
///
/// # Errors
/// Returns the `reqwest` error if the TLS backend cannot be initialised.
pub fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
}
