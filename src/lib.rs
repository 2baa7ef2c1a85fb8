//! GitHub Exporter - repository metrics to InfluxDB
//!
//! This crate collects traffic, popularity and CI metrics for every
//! repository the authenticated GitHub account owns, renders them as
//! InfluxDB line protocol and writes them in one gzip-compressed batch.
//! It can be used as a library, or run as a standalone binary with the
//! `github-exporter` executable.
//!
//! # Architecture
//!
//! - **Transport**: retrying HTTP exchange with exponential backoff
//! - **GitHub**: REST client, repository enumeration and eligibility filter
//! - **Collectors**: one per metric family (clones, paths, referrers, views,
//!   stars/forks, actions)
//! - **Coordinator**: concurrent fan-out over (repository, family) pairs
//! - **Publisher**: gzip batch write to the InfluxDB v2 API
//!
//! # Example
//!
//! ```rust,no_run
//! use github_exporter::{Exporter, ExporterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExporterConfig::load("github_exporter.json")?;
//!     let summary = Exporter::from_config(&config)?.run().await?;
//!     println!("wrote {} samples", summary.samples);
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod coordinator;
pub mod exporter;
pub mod github;
pub mod line_protocol;
pub mod publisher;
pub mod schedule;
pub mod transport;

pub use collector::{Collector, CollectorError, MetricFamily};
pub use config::{ConfigError, ExporterConfig};
pub use coordinator::{CollectionBuffer, Coordinator};
pub use exporter::{ExportError, Exporter, RunSummary};
pub use github::{GitHubApi, GitHubClient, GitHubError, Repository};
pub use line_protocol::{Sample, escape_tag_value};
pub use publisher::{InfluxPublisher, PublishError, PublishReport};
pub use schedule::Schedule;
pub use transport::{RetryPolicy, RetryingClient, TransportError};
