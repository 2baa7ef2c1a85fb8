//! GitHub Layer
//!
//! Typed access to the GitHub REST endpoints the exporter reads, plus the
//! repository eligibility filter.
//!
//! - [`GitHubApi`]: the data the collectors consume
//! - [`GitHubClient`]: REST implementation over the retrying transport
//! - [`select_exportable`]: drop archived, forked, private and disabled repositories

mod client;
mod error;
mod types;

pub use client::{
    API_VERSION, DEFAULT_API_URL, GitHubApi, GitHubClient, PER_PAGE, RateLimitPolicy,
    next_page_link,
};
pub use error::GitHubError;
pub use types::{
    Owner, Repository, TrafficClones, TrafficData, TrafficPath, TrafficReferrer, TrafficViews,
    Workflow, WorkflowList, WorkflowRun, WorkflowRunList,
};

/// Split `repositories` into the exportable set and the number skipped.
pub fn select_exportable(repositories: Vec<Repository>) -> (Vec<Repository>, usize) {
    let total = repositories.len();
    let eligible: Vec<Repository> = repositories
        .into_iter()
        .filter(|repo| {
            let keep = repo.is_exportable();
            if !keep {
                tracing::debug!(
                    repo = %repo.full_name,
                    archived = repo.archived,
                    fork = repo.fork,
                    private = repo.private,
                    disabled = repo.disabled,
                    "Skipping repository"
                );
            }
            keep
        })
        .collect();
    let skipped = total - eligible.len();
    (eligible, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_exportable() {
        let repos = vec![
            Repository::new("o", "public"),
            Repository::new("o", "archived").with_archived(true),
            Repository::new("o", "fork").with_fork(true),
            Repository::new("o", "private").with_private(true),
            Repository::new("o", "disabled").with_disabled(true),
            Repository::new("o", "also-public"),
        ];

        let (eligible, skipped) = select_exportable(repos);
        let names: Vec<&str> = eligible.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["public", "also-public"]);
        assert_eq!(skipped, 4);
    }

    #[test]
    fn test_select_exportable_empty() {
        let (eligible, skipped) = select_exportable(Vec::new());
        assert!(eligible.is_empty());
        assert_eq!(skipped, 0);
    }
}
