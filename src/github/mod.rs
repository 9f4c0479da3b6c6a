mod client;

pub use client::{FetchReleases, GitHub};
#[cfg(test)]
pub use client::MockFetchReleases;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A GitHub repository identified as "owner/repo".
#[derive(Debug, PartialEq, Clone)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for GitHubRepo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            Err(anyhow!("Invalid repository format. Expected 'owner/repo'."))
        } else {
            Ok(GitHubRepo {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}

/// A single downloadable file attached to a release.
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// A published GitHub release.
///
/// The display name follows the upstream convention `"<Product> <version>"`
/// (e.g. "Ghidra 10.1.2"), but GitHub allows it to be absent.
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct Release {
    pub name: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Response body of `GET /rate_limit`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RateLimit {
    pub rate: RateLimitStatus,
}

/// Remaining call quota and the unix time at which it resets.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RateLimitStatus {
    pub remaining: u64,
    pub reset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_repo_valid() {
        let repo = GitHubRepo::from_str("owner/repo").unwrap();
        assert_eq!(
            repo,
            GitHubRepo {
                owner: "owner".to_string(),
                repo: "repo".to_string()
            }
        );
    }

    #[test]
    fn test_parse_github_repo_invalid() {
        assert!(GitHubRepo::from_str("owner").is_err());
        assert!(GitHubRepo::from_str("owner/repo/extra").is_err());
        assert!(GitHubRepo::from_str("/repo").is_err());
        assert!(GitHubRepo::from_str("owner/").is_err());
    }

    #[test]
    fn test_github_repo_display() {
        let repo = GitHubRepo::from_str("nationalsecurityagency/ghidra").unwrap();
        assert_eq!(repo.to_string(), "nationalsecurityagency/ghidra");
    }

    #[test]
    fn test_release_deserialize_missing_assets() {
        let release: Release =
            serde_json::from_str(r#"{"name": "Ghidra 10.0", "created_at": "2021-06-25T19:09:41Z"}"#)
                .unwrap();
        assert_eq!(release.name.as_deref(), Some("Ghidra 10.0"));
        assert!(release.assets.is_empty());
    }

    #[test]
    fn test_rate_limit_deserialize() {
        let limit: RateLimit =
            serde_json::from_str(r#"{"rate": {"remaining": 42, "reset": 1700000000}}"#).unwrap();
        assert_eq!(limit.rate.remaining, 42);
        assert_eq!(limit.rate.reset, 1700000000);
    }
}
