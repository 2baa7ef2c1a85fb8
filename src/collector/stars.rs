//! Stargazer and fork counts.
//!
//! Derived from the repository descriptor already in hand; no API call.

use chrono::Utc;

use crate::collector::{Collector, CollectorError, MetricFamily};
use crate::github::Repository;
use crate::line_protocol::{Sample, measurement};

/// Stars and forks collector (`github_stats_stars`, `github_stats_forks`).
#[derive(Debug, Default, Clone, Copy)]
pub struct StarsForksCollector;

impl StarsForksCollector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Collector for StarsForksCollector {
    fn family(&self) -> MetricFamily {
        MetricFamily::StarsForks
    }

    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
        let now = Utc::now().timestamp();
        Ok(vec![
            Sample::new(measurement::STARS, now)
                .with_tag("repo", repo.full_name.as_str())
                .with_field("count", repo.stargazers_count),
            Sample::new(measurement::FORKS, now)
                .with_tag("repo", repo.full_name.as_str())
                .with_field("count", repo.forks_count),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stars_and_forks() {
        let repo = Repository::new("octo", "hello").with_counts(42, 7);
        let samples = StarsForksCollector::new().collect(&repo).await.unwrap();

        assert_eq!(samples.len(), 2);
        let now = samples[0].timestamp();
        assert_eq!(
            samples[0].to_string(),
            format!("github_stats_stars,repo=octo/hello count=42 {now}")
        );
        assert_eq!(
            samples[1].to_string(),
            format!("github_stats_forks,repo=octo/hello count=7 {now}")
        );
    }
}
