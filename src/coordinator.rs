//! Collection coordinator.
//!
//! Spawns one task per (repository, family) pair on a [`JoinSet`] and merges
//! their samples into a [`CollectionBuffer`] once every task has finished.
//! Each task accumulates locally, so the buffer has a single writer and needs
//! no lock.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::collector::{Collector, CollectorError, MetricFamily, standard_collectors};
use crate::github::{GitHubApi, Repository};
use crate::line_protocol::Sample;

/// Newline-delimited line protocol for one run.
///
/// Append-only; consumed by value when published.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionBuffer {
    payload: String,
    samples: usize,
}

impl CollectionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `samples`, one line each.
    pub fn append(&mut self, samples: &[Sample]) {
        for sample in samples {
            sample.write_line(&mut self.payload);
        }
        self.samples += samples.len();
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Number of samples appended.
    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn as_str(&self) -> &str {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload.into_bytes()
    }
}

/// Fans collectors out over repositories and fans their samples in.
#[derive(Clone)]
pub struct Coordinator {
    collectors: Vec<Arc<dyn Collector>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let families: Vec<MetricFamily> = self.collectors.iter().map(|c| c.family()).collect();
        f.debug_struct("Coordinator")
            .field("families", &families)
            .finish()
    }
}

impl Coordinator {
    /// Coordinator over an explicit collector set.
    pub fn new(collectors: Vec<Arc<dyn Collector>>) -> Self {
        Self { collectors }
    }

    /// Coordinator running every metric family against `api`.
    pub fn standard(api: Arc<dyn GitHubApi>) -> Self {
        Self::new(standard_collectors(api))
    }

    /// Run every collector for every repository and merge the results.
    ///
    /// All tasks run concurrently with no cap. The first failure observed
    /// aborts the tasks still running and is returned.
    ///
    /// # Errors
    /// - `CollectorError::Fetch` from the first failing collector
    /// - `CollectorError::Task` if a task panicked
    pub async fn collect(
        &self,
        repositories: Vec<Repository>,
    ) -> Result<CollectionBuffer, CollectorError> {
        let mut tasks = JoinSet::new();

        for repo in repositories {
            let repo = Arc::new(repo);
            for collector in &self.collectors {
                let (collector, repo) = (Arc::clone(collector), Arc::clone(&repo));
                tasks.spawn(async move {
                    let family = collector.family();
                    let samples = collector.collect(&repo).await?;
                    tracing::debug!(
                        repo = %repo.full_name,
                        family = %family,
                        samples = samples.len(),
                        "Collection task finished"
                    );
                    Ok::<_, CollectorError>(samples)
                });
            }
        }

        tracing::debug!(tasks = tasks.len(), "Spawned collection tasks");

        let mut buffer = CollectionBuffer::new();
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(CollectorError::from).and_then(|r| r);
            match result {
                Ok(samples) => buffer.append(&samples),
                Err(e) => {
                    tracing::debug!(
                        error = %e,
                        remaining = tasks.len(),
                        "Collection task failed, aborting run"
                    );
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::fake::FakeGitHub;
    use crate::github::{TrafficClones, TrafficData, Workflow};
    use std::time::Duration;

    fn clones(ts: i64, count: u64, uniques: u64) -> TrafficClones {
        TrafficClones {
            count,
            uniques,
            clones: vec![TrafficData {
                timestamp: chrono::DateTime::from_timestamp(ts, 0).unwrap(),
                count,
                uniques,
            }],
        }
    }

    #[test]
    fn test_buffer_append() {
        let mut buffer = CollectionBuffer::new();
        assert!(buffer.is_empty());

        buffer.append(&[
            Sample::new("m", 1).with_tag("repo", "a/b").with_field("count", 1),
            Sample::new("m", 2).with_tag("repo", "a/b").with_field("count", 2),
        ]);
        buffer.append(&[]);

        assert_eq!(buffer.sample_count(), 2);
        assert_eq!(buffer.as_str(), "m,repo=a/b count=1 1\nm,repo=a/b count=2 2\n");
        assert_eq!(buffer.len(), buffer.as_str().len());
    }

    #[tokio::test]
    async fn test_collect_single_repository() {
        let api = FakeGitHub::new().with_clones("owner/repo", clones(1_700_000_000, 5, 3));
        let coordinator = Coordinator::standard(Arc::new(api));

        let buffer = coordinator
            .collect(vec![Repository::new("owner", "repo").with_counts(2, 1)])
            .await
            .unwrap();

        assert!(
            buffer
                .as_str()
                .contains("github_stats_clones,repo=owner/repo count=5,uniques=3 1700000000\n")
        );
        // clones + stars + forks
        assert_eq!(buffer.sample_count(), 3);
        assert!(buffer.as_str().contains("github_stats_stars,repo=owner/repo count=2 "));
        assert!(buffer.as_str().contains("github_stats_forks,repo=owner/repo count=1 "));
    }

    #[tokio::test]
    async fn test_collect_every_family_for_every_repository() {
        let api = Arc::new(FakeGitHub::new());
        let coordinator = Coordinator::standard(Arc::clone(&api) as Arc<dyn GitHubApi>);

        let repos = vec![
            Repository::new("o", "a"),
            Repository::new("o", "b"),
            Repository::new("o", "c"),
        ];
        let buffer = coordinator.collect(repos).await.unwrap();

        // 4 traffic calls + 1 workflow listing per repository.
        assert_eq!(api.calls(), 15);
        // Stars and forks only.
        assert_eq!(buffer.sample_count(), 6);
        for name in ["o/a", "o/b", "o/c"] {
            assert!(buffer.as_str().contains(&format!("github_stats_stars,repo={name} ")));
        }
    }

    #[tokio::test]
    async fn test_collect_no_repositories() {
        let coordinator = Coordinator::standard(Arc::new(FakeGitHub::new()));
        let buffer = coordinator.collect(Vec::new()).await.unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.sample_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_run_concurrently() {
        let api = FakeGitHub::new().with_latency(Duration::from_secs(1));
        let coordinator = Coordinator::standard(Arc::new(api));
        let repos: Vec<Repository> = (0..20)
            .map(|i| Repository::new("o", format!("r{i}")))
            .collect();

        let start = tokio::time::Instant::now();
        let buffer = coordinator.collect(repos).await.unwrap();

        // Sequential execution would take 100 seconds.
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(buffer.sample_count(), 40);
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_run() {
        let api = FakeGitHub::new()
            .with_clones("o/good", clones(1_700_000_000, 1, 1))
            .with_workflows(
                "o/bad",
                vec![Workflow {
                    id: 1,
                    name: "CI".into(),
                }],
            )
            .failing("o/bad", MetricFamily::Actions);
        let coordinator = Coordinator::standard(Arc::new(api));

        let err = coordinator
            .collect(vec![Repository::new("o", "good"), Repository::new("o", "bad")])
            .await
            .unwrap_err();

        match err {
            CollectorError::Fetch { family, repo, .. } => {
                assert_eq!(family, MetricFamily::Actions);
                assert_eq!(repo, "o/bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_panicking_collector_reported_as_task_error() {
        struct Panics;

        #[async_trait::async_trait]
        impl Collector for Panics {
            fn family(&self) -> MetricFamily {
                MetricFamily::Views
            }

            async fn collect(&self, _repo: &Repository) -> Result<Vec<Sample>, CollectorError> {
                panic!("collector bug");
            }
        }

        let coordinator = Coordinator::new(vec![Arc::new(Panics)]);
        let err = coordinator
            .collect(vec![Repository::new("o", "r")])
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Task(_)));
    }
}
