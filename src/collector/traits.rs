//! Core collector traits and types.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::github::{GitHubError, Repository};
use crate::line_protocol::Sample;

/// Metric families, one collector each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MetricFamily {
    /// Clone traffic per day.
    Clones,
    /// Most visited paths.
    Paths,
    /// Top referring sites.
    Referrers,
    /// Page views per day.
    Views,
    /// Stargazer and fork counts.
    StarsForks,
    /// Workflow run durations.
    Actions,
}

/// Errors that can occur during collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// A GitHub call made by the collector failed.
    #[error("{family} collection failed for {repo}: {source}")]
    Fetch {
        family: MetricFamily,
        repo: String,
        #[source]
        source: GitHubError,
    },

    /// A collection task panicked or was cancelled.
    #[error("collection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CollectorError {
    /// Wrap a GitHub error with the family and repository it occurred in.
    pub fn fetch(family: MetricFamily, repo: &Repository, source: GitHubError) -> Self {
        Self::Fetch {
            family,
            repo: repo.full_name.clone(),
            source,
        }
    }
}

/// Core collector trait.
///
/// A collector turns one repository into zero or more samples of its family.
/// It never writes to shared state: the coordinator merges what each
/// invocation returns.
///
/// # Errors
///
/// Any failed fetch is returned as [`CollectorError::Fetch`]. Collectors do not
/// return partial results.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Family this collector produces.
    fn family(&self) -> MetricFamily;

    /// Collect samples for one repository.
    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError>;
}
