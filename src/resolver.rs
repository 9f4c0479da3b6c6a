//! Selecting a concrete download out of a release list.

use anyhow::Result;
use log::debug;

use crate::error::PackageError;
use crate::github::{Release, ReleaseAsset};

/// The resolver's sole output: a version label and the asset URL to fetch.
#[derive(Debug, PartialEq, Clone)]
pub struct ResolvedRelease {
    pub version: String,
    pub url: String,
}

/// A single condition an asset filename must satisfy.
#[derive(Debug, Clone)]
pub enum AssetPredicate {
    EndsWith(String),
    Contains(String),
}

impl AssetPredicate {
    fn matches(&self, name: &str) -> bool {
        match self {
            AssetPredicate::EndsWith(suffix) => name.ends_with(suffix.as_str()),
            AssetPredicate::Contains(needle) => name.contains(needle.as_str()),
        }
    }
}

impl std::fmt::Display for AssetPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetPredicate::EndsWith(suffix) => write!(f, "ends with '{}'", suffix),
            AssetPredicate::Contains(needle) => write!(f, "contains '{}'", needle),
        }
    }
}

/// Extract the version token from a release display name.
///
/// Relies entirely on the upstream naming convention `"<Product> <version>"`:
/// split on whitespace, take the second token. Anything else ("10.1.2",
/// "Release 9.1 BETA" with the version elsewhere) yields the wrong answer or
/// nothing; callers must treat `None` as "no version in this name".
pub fn version_from_name(name: &str) -> Option<&str> {
    name.split_whitespace().nth(1)
}

/// The version labels of all releases, for diagnostics and `--list-versions`.
pub fn version_labels(releases: &[Release]) -> Vec<String> {
    releases
        .iter()
        .filter_map(|r| r.name.as_deref())
        .filter_map(version_from_name)
        .map(str::to_string)
        .collect()
}

/// Resolve the most recent release to its version label and first asset.
///
/// Expects `releases` sorted descending by creation time, as returned by
/// [`crate::github::FetchReleases::releases`].
#[tracing::instrument(skip(releases))]
pub fn resolve_latest(releases: &[Release]) -> Result<ResolvedRelease> {
    let release = releases
        .first()
        .ok_or_else(|| PackageError::NotFound("no releases published".to_string()))?;

    let name = release.name.as_deref().unwrap_or_default();
    let version = version_from_name(name).ok_or_else(|| {
        PackageError::NotFound(format!("release name '{}' has no version token", name))
    })?;

    let asset = release.assets.first().ok_or_else(|| {
        PackageError::NotFound(format!("release '{}' has no assets", name))
    })?;

    debug!("Latest release is {} ({})", name, asset.browser_download_url);

    Ok(ResolvedRelease {
        version: version.to_string(),
        url: asset.browser_download_url.clone(),
    })
}

/// Resolve a version hint to the first release whose name contains it.
///
/// Substring matching is deliberate: "9.1" may match "9.1.2" or "9.1 BETA".
/// When several names contain the hint, the most recent release wins since
/// the list is sorted descending.
#[tracing::instrument(skip(releases))]
pub fn resolve_version(releases: &[Release], hint: &str) -> Result<ResolvedRelease> {
    let release = releases
        .iter()
        .find(|r| r.name.as_deref().is_some_and(|name| name.contains(hint)))
        .ok_or_else(|| {
            let available = version_labels(releases).join(", ");
            PackageError::NotFound(format!(
                "no release matching version '{}'. Available versions: {}",
                hint, available
            ))
        })?;

    let name = release.name.as_deref().unwrap_or_default();
    let asset = release.assets.first().ok_or_else(|| {
        PackageError::NotFound(format!("release '{}' has no assets", name))
    })?;

    debug!("Found version {} as release '{}'", hint, name);

    Ok(ResolvedRelease {
        version: hint.to_string(),
        url: asset.browser_download_url.clone(),
    })
}

/// Find the first asset whose filename satisfies every predicate.
///
/// Used for secondary artifacts such as a platform-specific VM build, where
/// the wanted file is identified by several independent naming conventions
/// (archive suffix, platform tag, VM flavor) at once.
#[tracing::instrument(skip(release))]
pub fn find_asset<'a>(
    release: &'a Release,
    predicates: &[AssetPredicate],
) -> Result<&'a ReleaseAsset> {
    release
        .assets
        .iter()
        .find(|asset| predicates.iter().all(|p| p.matches(&asset.name)))
        .ok_or_else(|| {
            let wanted: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
            PackageError::NotFound(format!(
                "no asset in release '{}' matching all of: {}",
                release.name.as_deref().unwrap_or("<unnamed>"),
                wanted.join(", ")
            ))
            .into()
        })
}
