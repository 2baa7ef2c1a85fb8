//! Retrying HTTP decorator.
//!
//! Wraps any [`HttpSend`] and re-issues a request while the outcome is a
//! transport error or a transient status, sleeping `base * 2^attempt` before
//! each retry. The request body is captured once and replayed unchanged on
//! every attempt.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Body, Request, Response, StatusCode};
use thiserror::Error;

/// Maximum number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles on each subsequent retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Response statuses treated as transient.
pub const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
];

/// Errors returned by [`RetryingClient::execute`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The last attempt failed below the HTTP layer (DNS, connect, TLS, timeout).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request body is a stream and cannot be replayed on retry.
    #[error("request body for {0} is not replayable")]
    UnreplayableBody(String),
}

/// A single HTTP exchange.
///
/// Implemented for `reqwest::Client`; tests substitute scripted fakes.
#[async_trait::async_trait]
pub trait HttpSend: Send + Sync + 'static {
    /// Send one request and return the raw outcome.
    async fn send(&self, request: Request) -> Result<Response, reqwest::Error>;
}

#[async_trait::async_trait]
impl HttpSend for reqwest::Client {
    async fn send(&self, request: Request) -> Result<Response, reqwest::Error> {
        self.execute(request).await
    }
}

/// Retry ceiling and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before retry 0.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom ceiling and base delay.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay to wait before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Whether `status` is one of [`RETRYABLE_STATUSES`].
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Retry predicate over one attempt's outcome.
pub fn should_retry(outcome: &Result<Response, reqwest::Error>) -> bool {
    match outcome {
        Ok(response) => is_retryable_status(response.status()),
        Err(_) => true,
    }
}

/// HTTP client decorator that retries transient failures.
#[derive(Clone)]
pub struct RetryingClient {
    inner: Arc<dyn HttpSend>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryingClient {
    /// Wrap `inner` with the given retry policy.
    pub fn new(inner: impl HttpSend, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(inner),
            policy,
        }
    }

    /// Get the retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Send `request`, retrying transient failures.
    ///
    /// After the retry ceiling is reached the last response is returned as-is,
    /// including a failing status; only the last transport error becomes `Err`.
    ///
    /// # Errors
    /// - `TransportError::UnreplayableBody` if the body is a stream
    /// - `TransportError::Http` if the final attempt failed below HTTP
    pub async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let body = capture_body(&request)?;
        let url = request.url().clone();

        let mut outcome = self.inner.send(replay(&request, &body)).await;
        let mut attempt = 0;

        while attempt < self.policy.max_retries && should_retry(&outcome) {
            let delay = self.policy.backoff(attempt);

            match outcome {
                Ok(response) => {
                    tracing::warn!(
                        status = %response.status(),
                        url = %url,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Previous request failed, retrying"
                    );
                    drain(response).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        url = %url,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Previous request errored, retrying"
                    );
                }
            }

            tokio::time::sleep(delay).await;
            outcome = self.inner.send(replay(&request, &body)).await;
            attempt += 1;
        }

        Ok(outcome?)
    }
}

/// Copy the request body so it can be re-sent on every attempt.
fn capture_body(request: &Request) -> Result<Option<Bytes>, TransportError> {
    match request.body() {
        None => Ok(None),
        Some(body) => body
            .as_bytes()
            .map(|b| Some(Bytes::copy_from_slice(b)))
            .ok_or_else(|| TransportError::UnreplayableBody(request.url().to_string())),
    }
}

/// Build a fresh attempt from the original request and captured body.
fn replay(template: &Request, body: &Option<Bytes>) -> Request {
    let mut request = Request::new(template.method().clone(), template.url().clone());
    *request.headers_mut() = template.headers().clone();
    *request.timeout_mut() = template.timeout().copied();
    *request.version_mut() = template.version();
    if let Some(bytes) = body {
        *request.body_mut() = Some(Body::from(bytes.clone()));
    }
    request
}

/// Read a discarded response to the end so its connection returns to the pool.
async fn drain(response: Response) {
    if let Err(e) = response.bytes().await {
        tracing::debug!(error = %e, "Failed to drain discarded response body");
    }
}
