//! Collector Layer
//!
//! One collector per metric family. Each turns a repository descriptor into
//! line-protocol samples and returns them to the caller; the
//! [`Coordinator`](crate::coordinator::Coordinator) runs them concurrently.
//!
//! # Families
//!
//! - [`ClonesCollector`]: `github_stats_clones`
//! - [`PathsCollector`]: `github_stats_paths`
//! - [`ReferrersCollector`]: `github_stats_referrals`
//! - [`ViewsCollector`]: `github_stats_views`
//! - [`StarsForksCollector`]: `github_stats_stars` and `github_stats_forks`
//! - [`ActionsCollector`]: `github_stats_actions`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use github_exporter::collector::{ClonesCollector, Collector};
//! use github_exporter::github::{GitHubApi, Repository};
//!
//! # async fn demo(api: Arc<dyn GitHubApi>) -> Result<(), Box<dyn std::error::Error>> {
//! let collector = ClonesCollector::new(api);
//! let samples = collector.collect(&Repository::new("octo", "hello")).await?;
//! for sample in samples {
//!     println!("{sample}");
//! }
//! # Ok(())
//! # }
//! ```

mod actions;
#[cfg(test)]
pub(crate) mod fake;
mod stars;
mod traffic;
mod traits;

use std::sync::Arc;

use crate::github::GitHubApi;

pub use actions::ActionsCollector;
pub use stars::StarsForksCollector;
pub use traffic::{ClonesCollector, PathsCollector, ReferrersCollector, ViewsCollector};
pub use traits::{Collector, CollectorError, MetricFamily};

/// The full set of collectors, one per family.
pub fn standard_collectors(api: Arc<dyn GitHubApi>) -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(ClonesCollector::new(Arc::clone(&api))),
        Arc::new(PathsCollector::new(Arc::clone(&api))),
        Arc::new(ReferrersCollector::new(Arc::clone(&api))),
        Arc::new(ViewsCollector::new(Arc::clone(&api))),
        Arc::new(StarsForksCollector::new()),
        Arc::new(ActionsCollector::new(api)),
    ]
}
