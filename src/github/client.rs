//! GitHub REST client built on the retrying transport.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::GitHubError;
use super::types::{
    Repository, TrafficClones, TrafficPath, TrafficReferrer, TrafficViews, Workflow,
    WorkflowList, WorkflowRun, WorkflowRunList,
};
use crate::transport::RetryingClient;

/// Default public API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version pinned on every request.
pub const API_VERSION: &str = "2022-11-28";

/// Page size requested from list endpoints (the API maximum).
pub const PER_PAGE: u32 = 100;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// What to do when the primary rate limit is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitPolicy {
    /// Sleep until the quota window resets, then re-issue the call once.
    #[default]
    SleepUntilReset,
    /// Fail immediately with [`GitHubError::RateLimited`].
    Fail,
}

/// Read access to the GitHub data the exporter consumes.
///
/// [`GitHubClient`] talks to the REST API; tests provide in-memory fakes.
#[async_trait::async_trait]
pub trait GitHubApi: Send + Sync + 'static {
    /// All repositories owned by the authenticated user.
    async fn list_owned_repositories(&self) -> Result<Vec<Repository>, GitHubError>;

    async fn traffic_clones(&self, owner: &str, repo: &str) -> Result<TrafficClones, GitHubError>;

    async fn traffic_views(&self, owner: &str, repo: &str) -> Result<TrafficViews, GitHubError>;

    async fn top_paths(&self, owner: &str, repo: &str) -> Result<Vec<TrafficPath>, GitHubError>;

    async fn top_referrers(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<TrafficReferrer>, GitHubError>;

    /// All workflows defined in a repository.
    async fn workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, GitHubError>;

    /// Most recent runs of one workflow (first page).
    async fn workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, GitHubError>;
}

/// Rate-limit condition reported by a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RateLimitHit {
    Primary { reset: DateTime<Utc> },
    Secondary { retry_after: Option<Duration> },
}

/// GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    transport: RetryingClient,
    base_url: Url,
    token: String,
    rate_limit: RateLimitPolicy,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url.as_str())
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client for `base_url` authenticating with `token`.
    ///
    /// `http` builds requests; `transport` sends them.
    ///
    /// # Errors
    /// Returns `GitHubError::InvalidBaseUrl` if `base_url` is not a usable
    /// HTTP(S) URL.
    pub fn new(
        http: reqwest::Client,
        transport: RetryingClient,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self, GitHubError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GitHubError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(GitHubError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            http,
            transport,
            base_url,
            token: token.into(),
            rate_limit: RateLimitPolicy::default(),
        })
    }

    /// Set the rate-limit policy.
    pub fn with_rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    /// Build an endpoint URL from path segments below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode one JSON page, returning the `next` link if any.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> Result<(T, Option<Url>), GitHubError> {
        let response = self.get(url).await?;
        let next = next_page_link(response.headers());
        let bytes = response.bytes().await?;
        let value = serde_json::from_slice(&bytes).map_err(|source| GitHubError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok((value, next))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, GitHubError> {
        self.get_page(url).await.map(|(value, _)| value)
    }

    /// GET every page starting at `url`, following `Link: rel="next"`.
    async fn get_all_pages<T, P>(
        &self,
        url: Url,
        mut items: impl FnMut(P) -> Vec<T>,
    ) -> Result<Vec<T>, GitHubError>
    where
        P: DeserializeOwned,
    {
        let mut all = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let (page, link) = self.get_page::<P>(&url).await?;
            all.extend(items(page));
            next = link;
        }
        Ok(all)
    }

    /// Issue an authenticated GET, cooperating with the primary rate limit.
    async fn get(&self, url: &Url) -> Result<Response, GitHubError> {
        let mut waited = false;
        loop {
            let request = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .header(ACCEPT, ACCEPT_GITHUB_JSON)
                .header(API_VERSION_HEADER, API_VERSION)
                .build()?;

            let response = self.transport.execute(request).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let hit = rate_limit_hit(status, response.headers());
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Failed to read error response body");
                    String::new()
                }
            };

            match hit.or_else(|| secondary_from_body(status, &body)) {
                Some(RateLimitHit::Primary { reset })
                    if self.rate_limit == RateLimitPolicy::SleepUntilReset && !waited =>
                {
                    let wait = (reset - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                    tracing::info!(
                        url = %url,
                        reset = %reset,
                        wait_secs = wait.as_secs(),
                        "Primary rate limit reached, sleeping until reset"
                    );
                    tokio::time::sleep(wait).await;
                    waited = true;
                }
                Some(RateLimitHit::Primary { reset }) => {
                    return Err(GitHubError::RateLimited { reset });
                }
                Some(RateLimitHit::Secondary { retry_after }) => {
                    return Err(GitHubError::SecondaryRateLimited { retry_after });
                }
                None => {
                    return Err(GitHubError::Status {
                        status,
                        url: url.to_string(),
                        body,
                    });
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl GitHubApi for GitHubClient {
    async fn list_owned_repositories(&self) -> Result<Vec<Repository>, GitHubError> {
        let mut url = self.endpoint(&["user", "repos"])?;
        url.query_pairs_mut()
            .append_pair("type", "owner")
            .append_pair("per_page", &PER_PAGE.to_string());
        self.get_all_pages(url, |page: Vec<Repository>| page).await
    }

    async fn traffic_clones(&self, owner: &str, repo: &str) -> Result<TrafficClones, GitHubError> {
        let url = self.endpoint(&["repos", owner, repo, "traffic", "clones"])?;
        self.get_json(&url).await
    }

    async fn traffic_views(&self, owner: &str, repo: &str) -> Result<TrafficViews, GitHubError> {
        let url = self.endpoint(&["repos", owner, repo, "traffic", "views"])?;
        self.get_json(&url).await
    }

    async fn top_paths(&self, owner: &str, repo: &str) -> Result<Vec<TrafficPath>, GitHubError> {
        let url = self.endpoint(&["repos", owner, repo, "traffic", "popular", "paths"])?;
        self.get_json(&url).await
    }

    async fn top_referrers(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<TrafficReferrer>, GitHubError> {
        let url = self.endpoint(&["repos", owner, repo, "traffic", "popular", "referrers"])?;
        self.get_json(&url).await
    }

    async fn workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, GitHubError> {
        let mut url = self.endpoint(&["repos", owner, repo, "actions", "workflows"])?;
        url.query_pairs_mut().append_pair("per_page", &PER_PAGE.to_string());
        self.get_all_pages(url, |page: WorkflowList| page.workflows).await
    }

    async fn workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, GitHubError> {
        let id = workflow_id.to_string();
        let mut url = self.endpoint(&["repos", owner, repo, "actions", "workflows", &id, "runs"])?;
        url.query_pairs_mut().append_pair("per_page", &PER_PAGE.to_string());
        let page: WorkflowRunList = self.get_json(&url).await?;
        Ok(page.workflow_runs)
    }
}

/// Classify a failed response from its rate-limit headers.
fn rate_limit_hit(status: StatusCode, headers: &HeaderMap) -> Option<RateLimitHit> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header(RATE_LIMIT_REMAINING) == Some("0") {
        let reset = header(RATE_LIMIT_RESET)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        return Some(RateLimitHit::Primary { reset });
    }

    if let Some(retry_after) = headers.get(RETRY_AFTER) {
        let retry_after = retry_after
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Some(RateLimitHit::Secondary { retry_after });
    }

    None
}

/// Secondary limits are sometimes signalled only in the error message.
fn secondary_from_body(status: StatusCode, body: &str) -> Option<RateLimitHit> {
    let limited = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;
    let body = body.to_ascii_lowercase();
    (limited && (body.contains("secondary rate limit") || body.contains("abuse detection")))
        .then_some(RateLimitHit::Secondary { retry_after: None })
}

/// Extract the `rel="next"` target from a `Link` header.
pub fn next_page_link(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == r#"rel="next""# || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
