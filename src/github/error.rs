//! GitHub client error types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by GitHub API calls.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Primary rate limit exhausted and the call was not allowed to wait.
    #[error("hit rate limit (resets at {reset})")]
    RateLimited { reset: DateTime<Utc> },

    /// Secondary (abuse) rate limit triggered.
    #[error("hit secondary rate limit")]
    SecondaryRateLimited { retry_after: Option<Duration> },

    /// The API answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Building the request or reading the body failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured API base URL cannot carry path segments.
    #[error("invalid GitHub API URL: {0}")]
    InvalidBaseUrl(String),
}
