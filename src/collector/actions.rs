//! Actions workflow run durations.
//!
//! Two-level fetch: list the repository's workflows, then the runs of each.
//! One sample per run, stamped with the run's creation time.

use std::sync::Arc;

use crate::collector::{Collector, CollectorError, MetricFamily};
use crate::github::{GitHubApi, Repository};
use crate::line_protocol::{Sample, escape_tag_value, measurement};

/// Workflow run duration collector (`github_stats_actions`).
pub struct ActionsCollector {
    api: Arc<dyn GitHubApi>,
}

impl ActionsCollector {
    pub fn new(api: Arc<dyn GitHubApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Collector for ActionsCollector {
    fn family(&self) -> MetricFamily {
        MetricFamily::Actions
    }

    async fn collect(&self, repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
        let owner = repo.owner_login();
        let fail = |e| CollectorError::fetch(MetricFamily::Actions, repo, e);

        let workflows = self.api.workflows(owner, &repo.name).await.map_err(fail)?;

        let mut samples = Vec::new();
        for workflow in &workflows {
            let runs = self
                .api
                .workflow_runs(owner, &repo.name, workflow.id)
                .await
                .map_err(fail)?;

            let workflow_tag = escape_tag_value(&workflow.name);
            samples.extend(runs.iter().map(|run| {
                Sample::new(measurement::ACTIONS, run.created_at.timestamp())
                    .with_tag("repo", repo.full_name.as_str())
                    .with_tag("workflow", workflow_tag.clone())
                    .with_field("duration", run.duration_secs())
            }));
        }

        tracing::debug!(
            repo = %repo.full_name,
            workflows = workflows.len(),
            runs = samples.len(),
            "Collected workflow runs"
        );
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::fake::FakeGitHub;
    use crate::github::{Workflow, WorkflowRun};

    fn run(id: u64, created: &str, started: &str, updated: &str) -> WorkflowRun {
        WorkflowRun {
            id,
            created_at: created.parse().unwrap(),
            updated_at: updated.parse().unwrap(),
            run_started_at: Some(started.parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn test_run_durations_per_workflow() {
        let repo = Repository::new("owner", "repo");
        let api = FakeGitHub::new()
            .with_workflows(
                "owner/repo",
                vec![
                    Workflow {
                        id: 10,
                        name: "CI".into(),
                    },
                    Workflow {
                        id: 11,
                        name: "Release, nightly".into(),
                    },
                ],
            )
            .with_runs(
                10,
                vec![
                    run(
                        1,
                        "2023-11-14T22:13:20Z",
                        "2023-11-14T22:13:25Z",
                        "2023-11-14T22:15:25Z",
                    ),
                    run(
                        2,
                        "2023-11-15T08:00:00Z",
                        "2023-11-15T08:00:00Z",
                        "2023-11-15T08:00:59Z",
                    ),
                ],
            )
            .with_runs(
                11,
                vec![run(
                    3,
                    "2023-11-16T00:00:00Z",
                    "2023-11-16T00:01:00Z",
                    "2023-11-16T00:11:00Z",
                )],
            );

        let samples = ActionsCollector::new(Arc::new(api))
            .collect(&repo)
            .await
            .unwrap();

        let lines: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            lines,
            [
                "github_stats_actions,repo=owner/repo,workflow=CI duration=120 1700000000",
                "github_stats_actions,repo=owner/repo,workflow=CI duration=59 1700035200",
                r"github_stats_actions,repo=owner/repo,workflow=Release\,\ nightly duration=600 1700092800",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_workflows() {
        let repo = Repository::new("owner", "repo");
        let samples = ActionsCollector::new(Arc::new(FakeGitHub::new()))
            .collect(&repo)
            .await
            .unwrap();
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn test_runs_failure_fails_whole_family() {
        let repo = Repository::new("owner", "repo");
        let api = FakeGitHub::new()
            .with_workflows(
                "owner/repo",
                vec![Workflow {
                    id: 10,
                    name: "CI".into(),
                }],
            )
            .failing("owner/repo", MetricFamily::Actions);

        let err = ActionsCollector::new(Arc::new(api))
            .collect(&repo)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("actions collection failed for owner/repo"));
    }
}
