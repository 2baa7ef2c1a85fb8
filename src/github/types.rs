//! GitHub REST API data shapes.
//!
//! Only the fields the exporter reads are modelled; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository descriptor as returned by `GET /user/repos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,
    pub name: String,
    pub owner: Owner,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

impl Repository {
    /// Create a public, active, non-fork repository descriptor.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        Self {
            full_name: format!("{owner}/{name}"),
            name,
            owner: Owner { login: owner },
            archived: false,
            fork: false,
            private: false,
            disabled: false,
            stargazers_count: 0,
            forks_count: 0,
        }
    }

    /// Owner login.
    pub fn owner_login(&self) -> &str {
        &self.owner.login
    }

    /// Whether metrics are exported for this repository.
    pub fn is_exportable(&self) -> bool {
        !self.archived && !self.fork && !self.private && !self.disabled
    }

    /// Set the archived flag.
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    /// Set the fork flag.
    pub fn with_fork(mut self, fork: bool) -> Self {
        self.fork = fork;
        self
    }

    /// Set the private flag.
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Set the disabled flag.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set stargazer and fork counts.
    pub fn with_counts(mut self, stargazers: u64, forks: u64) -> Self {
        self.stargazers_count = stargazers;
        self.forks_count = forks;
        self
    }
}

/// One day (or week) bucket of clone or view traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficData {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    pub uniques: u64,
}

/// Response of `GET /repos/{owner}/{repo}/traffic/clones`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficClones {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
    #[serde(default)]
    pub clones: Vec<TrafficData>,
}

/// Response of `GET /repos/{owner}/{repo}/traffic/views`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficViews {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
    #[serde(default)]
    pub views: Vec<TrafficData>,
}

/// Entry of `GET /repos/{owner}/{repo}/traffic/popular/paths`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPath {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    pub count: u64,
    pub uniques: u64,
}

/// Entry of `GET /repos/{owner}/{repo}/traffic/popular/referrers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficReferrer {
    pub referrer: String,
    pub count: u64,
    pub uniques: u64,
}

/// An Actions workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
}

/// Response of `GET /repos/{owner}/{repo}/actions/workflows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

/// One execution of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    /// Whole seconds from run start to last update, never negative.
    ///
    /// Runs without `run_started_at` are measured from `created_at`.
    pub fn duration_secs(&self) -> u64 {
        let started = self.run_started_at.unwrap_or(self.created_at);
        let secs = (self.updated_at - started).num_seconds();
        u64::try_from(secs).unwrap_or(0)
    }
}

/// Response of `GET /repos/{owner}/{repo}/actions/workflows/{id}/runs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRunList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}
