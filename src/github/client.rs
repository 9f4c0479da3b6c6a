use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use std::time::Duration;

use super::{GitHubRepo, RateLimit, RateLimitStatus, Release};
use crate::error::PackageError;

/// Safety margin added on top of the advertised rate-limit reset time.
const RATE_LIMIT_MARGIN_SECS: u64 = 5;

/// Shape of the error object GitHub returns in place of a release list,
/// e.g. when an unauthenticated caller is rate-limited.
#[derive(serde::Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FetchReleases: Send + Sync {
    /// Fetch all releases for a repository, sorted descending by creation
    /// time so the first element is the latest release.
    async fn releases(&self, repo: &GitHubRepo) -> Result<Vec<Release>>;
}

pub struct GitHub {
    pub client: Client,
    pub api_url: String,
}

impl GitHub {
    #[tracing::instrument(skip(client, api_url))]
    pub fn new(client: Client, api_url: Option<String>) -> Self {
        let api_url = api_url.unwrap_or_else(|| "https://api.github.com".to_string());
        Self { client, api_url }
    }

    /// Block until the API quota allows another call.
    ///
    /// Checks `GET /rate_limit`; when no calls remain, sleeps until the
    /// stated reset time plus [`RATE_LIMIT_MARGIN_SECS`].
    #[tracing::instrument(skip(self))]
    async fn await_rate_limit(&self) -> Result<()> {
        let url = format!("{}/rate_limit", self.api_url);

        debug!("Checking rate limit at {}...", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PackageError::Upstream(format!("rate limit check failed: {}", e)))?;

        let limit: RateLimit = response
            .json()
            .await
            .map_err(|e| PackageError::Upstream(format!("malformed rate limit response: {}", e)))?;

        if let Some(wait) = wait_duration(&limit.rate, Utc::now().timestamp()) {
            warn!(
                "Rate limit exhausted, resets at unix time {}. Waiting {:?} before continuing.",
                limit.rate.reset, wait
            );
            tokio::time::sleep(wait).await;
            info!("Rate limit wait over, continuing.");
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, repo))]
    async fn fetch_releases(&self, repo: &GitHubRepo) -> Result<Vec<Release>> {
        self.await_rate_limit().await?;

        let mut releases = Vec::new();
        let mut page = 1;

        // Limit to 10 pages (1000 releases) to be safe for now/prevent infinite loop
        while page <= 10 {
            let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);

            debug!("Fetching releases page {} from {}...", page, url);

            let response = self
                .client
                .get(&url)
                .query(&[("per_page", "100"), ("page", &page.to_string())])
                .send()
                .await
                .map_err(|e| {
                    PackageError::Upstream(format!("request to GitHub API failed: {}", e))
                })?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                PackageError::Upstream(format!("failed to read GitHub API response: {}", e))
            })?;

            let parsed: Vec<Release> = parse_release_list(status, &body)?;

            if parsed.is_empty() {
                break;
            }

            let len = parsed.len();
            releases.extend(parsed);

            if len < 100 {
                break;
            }

            page += 1;
        }

        releases.sort_by_key(|r| std::cmp::Reverse(parse_created_at(&r.created_at)));

        Ok(releases)
    }
}

#[async_trait]
impl FetchReleases for GitHub {
    #[tracing::instrument(skip(self, repo))]
    async fn releases(&self, repo: &GitHubRepo) -> Result<Vec<Release>> {
        self.fetch_releases(repo).await
    }
}

/// How long to wait before the next API call, or `None` if quota remains.
fn wait_duration(status: &RateLimitStatus, now: i64) -> Option<Duration> {
    if status.remaining > 0 {
        return None;
    }
    let until_reset = status.reset.saturating_sub(now).max(0) as u64;
    Some(Duration::from_secs(until_reset + RATE_LIMIT_MARGIN_SECS))
}

/// Interpret a releases-endpoint body that may be a list or an error object.
fn parse_release_list(status: reqwest::StatusCode, body: &str) -> Result<Vec<Release>> {
    match serde_json::from_str::<Vec<Release>>(body) {
        Ok(releases) => Ok(releases),
        Err(_) => {
            // When unauthenticated and rate-limited, GitHub responds with an
            // error object instead of a list. Surface its message rather
            // than treating the project as having no releases.
            if let Ok(err) = serde_json::from_str::<ApiErrorBody>(body) {
                Err(PackageError::Upstream(format!("GitHub API error (HTTP {}): {}", status, err.message)).into())
            } else {
                Err(PackageError::Upstream(format!(
                    "unexpected GitHub API response (HTTP {})",
                    status
                ))
                .into())
            }
        }
    }
}

/// Parse a release creation timestamp for ordering.
///
/// Timestamp comparison, not string comparison: differing timestamp formats
/// must not change the ordering. An unparseable timestamp sorts last.
fn parse_created_at(created_at: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
