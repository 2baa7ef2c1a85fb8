//! In-memory [`GitHubApi`] for collector and coordinator tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;

use crate::collector::MetricFamily;
use crate::github::{
    GitHubApi, GitHubError, Repository, TrafficClones, TrafficPath, TrafficReferrer,
    TrafficViews, Workflow, WorkflowRun,
};

#[derive(Default)]
pub(crate) struct FakeGitHub {
    repositories: Vec<Repository>,
    clones: HashMap<String, TrafficClones>,
    views: HashMap<String, TrafficViews>,
    paths: HashMap<String, Vec<TrafficPath>>,
    referrers: HashMap<String, Vec<TrafficReferrer>>,
    workflows: HashMap<String, Vec<Workflow>>,
    runs: HashMap<u64, Vec<WorkflowRun>>,
    failures: HashSet<(String, MetricFamily)>,
    latency: Duration,
    calls: AtomicUsize,
}

impl FakeGitHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_repositories(mut self, repositories: Vec<Repository>) -> Self {
        self.repositories = repositories;
        self
    }

    pub(crate) fn with_clones(mut self, repo: &str, clones: TrafficClones) -> Self {
        self.clones.insert(repo.to_string(), clones);
        self
    }

    pub(crate) fn with_views(mut self, repo: &str, views: TrafficViews) -> Self {
        self.views.insert(repo.to_string(), views);
        self
    }

    pub(crate) fn with_paths(mut self, repo: &str, paths: Vec<TrafficPath>) -> Self {
        self.paths.insert(repo.to_string(), paths);
        self
    }

    pub(crate) fn with_referrers(mut self, repo: &str, referrers: Vec<TrafficReferrer>) -> Self {
        self.referrers.insert(repo.to_string(), referrers);
        self
    }

    pub(crate) fn with_workflows(mut self, repo: &str, workflows: Vec<Workflow>) -> Self {
        self.workflows.insert(repo.to_string(), workflows);
        self
    }

    pub(crate) fn with_runs(mut self, workflow_id: u64, runs: Vec<WorkflowRun>) -> Self {
        self.runs.insert(workflow_id, runs);
        self
    }

    /// Make the `family` call for `repo` answer 500. For actions, the runs
    /// listing fails while the workflow listing succeeds.
    pub(crate) fn failing(mut self, repo: &str, family: MetricFamily) -> Self {
        self.failures.insert((repo.to_string(), family));
        self
    }

    /// Delay every call by `latency`.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of API calls served.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn call(
        &self,
        owner: &str,
        repo: &str,
        family: MetricFamily,
    ) -> Result<String, GitHubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let full_name = format!("{owner}/{repo}");
        if self.failures.contains(&(full_name.clone(), family)) {
            return Err(GitHubError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                url: format!("fake://{full_name}/{family}"),
                body: "boom".to_string(),
            });
        }
        Ok(full_name)
    }
}

#[async_trait::async_trait]
impl GitHubApi for FakeGitHub {
    async fn list_owned_repositories(&self) -> Result<Vec<Repository>, GitHubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.repositories.clone())
    }

    async fn traffic_clones(&self, owner: &str, repo: &str) -> Result<TrafficClones, GitHubError> {
        let key = self.call(owner, repo, MetricFamily::Clones).await?;
        Ok(self.clones.get(&key).cloned().unwrap_or_default())
    }

    async fn traffic_views(&self, owner: &str, repo: &str) -> Result<TrafficViews, GitHubError> {
        let key = self.call(owner, repo, MetricFamily::Views).await?;
        Ok(self.views.get(&key).cloned().unwrap_or_default())
    }

    async fn top_paths(&self, owner: &str, repo: &str) -> Result<Vec<TrafficPath>, GitHubError> {
        let key = self.call(owner, repo, MetricFamily::Paths).await?;
        Ok(self.paths.get(&key).cloned().unwrap_or_default())
    }

    async fn top_referrers(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<TrafficReferrer>, GitHubError> {
        let key = self.call(owner, repo, MetricFamily::Referrers).await?;
        Ok(self.referrers.get(&key).cloned().unwrap_or_default())
    }

    async fn workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, GitHubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let key = format!("{owner}/{repo}");
        Ok(self.workflows.get(&key).cloned().unwrap_or_default())
    }

    async fn workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, GitHubError> {
        self.call(owner, repo, MetricFamily::Actions).await?;
        Ok(self.runs.get(&workflow_id).cloned().unwrap_or_default())
    }
}
