//! One export run: enumerate, collect, publish.

use std::sync::Arc;

use thiserror::Error;

use crate::collector::CollectorError;
use crate::config::{ConfigError, ExporterConfig};
use crate::coordinator::Coordinator;
use crate::github::{GitHubApi, GitHubClient, GitHubError, select_exportable};
use crate::publisher::{InfluxPublisher, PublishError};
use crate::transport::{RetryPolicy, RetryingClient, build_http_client};

/// Run-level errors. Any of them fails the run as a unit.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("error building HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Repository enumeration or GitHub client setup failed.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Collect(#[from] CollectorError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Repositories collected.
    pub eligible: usize,
    /// Repositories filtered out as archived, forked, private or disabled.
    pub skipped: usize,
    pub samples: usize,
    pub payload_bytes: usize,
    pub compressed_bytes: usize,
}

/// Wires the pipeline stages together.
#[derive(Clone)]
pub struct Exporter {
    github: Arc<dyn GitHubApi>,
    coordinator: Coordinator,
    publisher: InfluxPublisher,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("coordinator", &self.coordinator)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Exporter running every metric family against `github`.
    pub fn new(github: Arc<dyn GitHubApi>, publisher: InfluxPublisher) -> Self {
        Self {
            coordinator: Coordinator::standard(Arc::clone(&github)),
            github,
            publisher,
        }
    }

    /// Build the HTTP stack, GitHub client and publisher from `config`.
    ///
    /// # Errors
    /// - `ExportError::Config` if the database URL is malformed
    /// - `ExportError::HttpClient` if the HTTP client cannot be built
    /// - `ExportError::GitHub` if the GitHub API URL is unusable
    pub fn from_config(config: &ExporterConfig) -> Result<Self, ExportError> {
        let http = build_http_client(config.connect_timeout, config.request_timeout)
            .map_err(ExportError::HttpClient)?;
        let transport = RetryingClient::new(http.clone(), RetryPolicy::default());

        let github = GitHubClient::new(
            http.clone(),
            transport.clone(),
            &config.github_api_url,
            config.github_api_token.clone(),
        )?;
        let publisher = InfluxPublisher::new(
            http,
            transport,
            config.write_url()?,
            config.influxdb_api_token.clone(),
        );

        Ok(Self::new(Arc::new(github), publisher))
    }

    /// Perform one complete run.
    ///
    /// Nothing is published unless every collection task succeeds.
    ///
    /// # Errors
    /// - `ExportError::GitHub` if enumeration fails
    /// - `ExportError::Collect` if any collector fails
    /// - `ExportError::Publish` if there is nothing to send or the write fails
    pub async fn run(&self) -> Result<RunSummary, ExportError> {
        tracing::info!("Starting export run");

        let repositories = self.github.list_owned_repositories().await?;
        let total = repositories.len();
        let (eligible, skipped) = select_exportable(repositories);
        tracing::info!(
            total,
            eligible = eligible.len(),
            skipped,
            "Enumerated repositories"
        );
        let eligible_count = eligible.len();

        let buffer = self.coordinator.collect(eligible).await?;
        tracing::debug!(
            samples = buffer.sample_count(),
            bytes = buffer.len(),
            "Collection finished"
        );

        let report = self.publisher.publish(buffer).await?;
        let summary = RunSummary {
            eligible: eligible_count,
            skipped,
            samples: report.samples,
            payload_bytes: report.payload_bytes,
            compressed_bytes: report.compressed_bytes,
        };

        tracing::info!(
            eligible = summary.eligible,
            skipped = summary.skipped,
            samples = summary.samples,
            payload_bytes = summary.payload_bytes,
            compressed_bytes = summary.compressed_bytes,
            status = %report.status,
            "Export run finished"
        );
        Ok(summary)
    }
}
