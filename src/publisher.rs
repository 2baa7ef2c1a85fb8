//! InfluxDB batch publisher.
//!
//! Gzips a [`CollectionBuffer`] and writes it with a single
//! `POST /api/v2/write` through the retrying transport.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use thiserror::Error;
use url::Url;

use crate::coordinator::CollectionBuffer;
use crate::transport::{RetryingClient, TransportError};

const CONTENT_TYPE_LINE_PROTOCOL: &str = "text/plain; charset=utf-8";

/// Errors that can occur while publishing a batch.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The run produced no samples.
    #[error("no data to send")]
    NoData,

    /// Gzip compression failed.
    #[error("error compressing data: {0}")]
    Compress(#[from] std::io::Error),

    /// Building the request failed.
    #[error("error building write request: {0}")]
    Request(#[from] reqwest::Error),

    /// No response was received.
    #[error("error sending data: {0}")]
    Transport(#[from] TransportError),

    /// The error response body could not be read.
    #[error("error reading data: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The database answered with a non-2xx status.
    #[error("error sending data: {status} {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Outcome of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// Samples written.
    pub samples: usize,
    /// Uncompressed payload size in bytes.
    pub payload_bytes: usize,
    /// Compressed body size in bytes.
    pub compressed_bytes: usize,
    /// Status returned by the database.
    pub status: StatusCode,
}

/// Gzip `payload` with the default compression level.
pub fn compress(payload: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// Writes collected batches to InfluxDB.
#[derive(Clone)]
pub struct InfluxPublisher {
    http: reqwest::Client,
    transport: RetryingClient,
    write_url: Url,
    token: String,
}

impl std::fmt::Debug for InfluxPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxPublisher")
            .field("write_url", &self.write_url.as_str())
            .finish_non_exhaustive()
    }
}

impl InfluxPublisher {
    /// Create a publisher for a fully-formed write URL (including the
    /// `precision`, `org` and `bucket` query parameters).
    pub fn new(
        http: reqwest::Client,
        transport: RetryingClient,
        write_url: Url,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            transport,
            write_url,
            token: token.into(),
        }
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }

    /// Compress and upload `buffer`.
    ///
    /// # Errors
    /// - `PublishError::NoData` if `buffer` is empty (nothing is sent)
    /// - `PublishError::Compress` / `Request` / `Transport` on local or network failure
    /// - `PublishError::Rejected` with the response body on a non-2xx status
    pub async fn publish(&self, buffer: CollectionBuffer) -> Result<PublishReport, PublishError> {
        if buffer.is_empty() {
            return Err(PublishError::NoData);
        }

        let samples = buffer.sample_count();
        let payload_bytes = buffer.len();
        let body = compress(&buffer.into_bytes())?;
        let compressed_bytes = body.len();

        let request = self
            .http
            .post(self.write_url.clone())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_ENCODING, "gzip")
            .header(CONTENT_TYPE, CONTENT_TYPE_LINE_PROTOCOL)
            .body(body)
            .build()?;

        tracing::debug!(
            url = %self.write_url,
            samples,
            payload_bytes,
            compressed_bytes,
            "Sending batch"
        );

        let response = self.transport.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(PublishError::ReadBody)?;
            return Err(PublishError::Rejected { status, body });
        }

        Ok(PublishReport {
            samples,
            payload_bytes,
            compressed_bytes,
            status,
        })
    }
}
