//! Traffic collectors: clones, views, popular paths and referrers.
//!
//! Clone and view samples carry the timestamp GitHub reports for each bucket.
//! Path and referrer lists are snapshots, stamped with the collection time.

use std::sync::Arc;

use chrono::Utc;

use crate::collector::{Collector, CollectorError, MetricFamily};
use crate::github::{GitHubApi, Repository, TrafficData};
use crate::line_protocol::{Sample, escape_tag_value, measurement};

fn bucket_sample(name: &'static str, repo: &Repository, data: &TrafficData) -> Sample {
    Sample::new(name, data.timestamp.timestamp())
        .with_tag("repo", repo.full_name.as_str())
        .with_field("count", data.count)
        .with_field("uniques", data.uniques)
}

/// Clone traffic collector (`github_stats_clones`).
pub struct ClonesCollector {
    api: Arc<dyn GitHubApi>,
}

impl ClonesCollector {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Collector for ClonesCollector {
    fn family(&self) -> MetricFamily {
        MetricFamily::Clones
    }

    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
        let clones = self
            .api
            .traffic_clones(repo.owner_login(), &repo.name)
            .await
            .map_err(|e| CollectorError::fetch(self.family(), repo, e))?;

        Ok(clones
            .clones
            .iter()
            .map(|data| bucket_sample(measurement::CLONES, repo, data))
            .collect())
    }
}

/// View traffic collector (`github_stats_views`).
pub struct ViewsCollector {
    api: Arc<dyn GitHubApi>,
}

impl ViewsCollector {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Collector for ViewsCollector {
    fn family(&self) -> MetricFamily {
        MetricFamily::Views
    }

    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
        let views = self
            .api
            .traffic_views(repo.owner_login(), &repo.name)
            .await
            .map_err(|e| CollectorError::fetch(self.family(), repo, e))?;

        Ok(views
            .views
            .iter()
            .map(|data| bucket_sample(measurement::VIEWS, repo, data))
            .collect())
    }
}

/// Popular paths collector (`github_stats_paths`).
pub struct PathsCollector {
    api: Arc<dyn GitHubApi>,
}

impl PathsCollector {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Collector for PathsCollector {
    fn family(&self) -> MetricFamily {
        MetricFamily::Paths
    }

    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
        let paths = self
            .api
            .top_paths(repo.owner_login(), &repo.name)
            .await
            .map_err(|e| CollectorError::fetch(self.family(), repo, e))?;

        let now = Utc::now().timestamp();
        Ok(paths
            .iter()
            .map(|p| {
                Sample::new(measurement::PATHS, now)
                    .with_tag("repo", repo.full_name.as_str())
                    .with_tag("path", escape_tag_value(&p.path))
                    .with_field("count", p.count)
                    .with_field("uniques", p.uniques)
            })
            .collect())
    }
}

/// Top referrers collector (`github_stats_referrals`).
pub struct ReferrersCollector {
    api: Arc<dyn GitHubApi>,
}

impl ReferrersCollector {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Collector for ReferrersCollector {
    fn family(&self) -> MetricFamily {
        MetricFamily::Referrers
    }

    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
        let referrers = self
            .api
            .top_referrers(repo.owner_login(), &repo.name)
            .await
            .map_err(|e| CollectorError::fetch(self.family(), repo, e))?;

        let now = Utc::now().timestamp();
        Ok(referrers
            .iter()
            .map(|r| {
                Sample::new(measurement::REFERRALS, now)
                    .with_tag("repo", repo.full_name.as_str())
                    .with_tag("referrer", escape_tag_value(&r.referrer))
                    .with_field("count", r.count)
                    .with_field("uniques", r.uniques)
            })
            .collect())
    }
}
