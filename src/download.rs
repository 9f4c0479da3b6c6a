//! Cache-aware downloads of release archives.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use log::info;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PackageError;

/// Last path segment of a URL, used as the cache filename.
pub fn filename_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Download `url` into the cache directory, returning the cached path.
///
/// A file that is already present in the cache is reused without touching
/// the network. The download streams into a `.part` file and is renamed
/// only on success, so an interrupted run never leaves a truncated archive
/// behind under the final name.
#[tracing::instrument(skip(client, cache_dir))]
pub async fn fetch_cached(
    client: &Client,
    url: &str,
    cache_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let filename = filename.unwrap_or_else(|| filename_from_url(url));
    let dest = cache_dir.join(filename);

    if dest.exists() {
        info!("Using cached {}", dest.display());
        return Ok(dest);
    }

    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;

    info!("{} does not exist. Downloading from {}", dest.display(), url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PackageError::Download(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PackageError::Download(format!("HTTP {} fetching {}", status, url)).into());
    }

    let part = cache_dir.join(format!("{}.part", filename));
    let mut file = std::fs::File::create(&part)
        .with_context(|| format!("Failed to create {}", part.display()))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| PackageError::Download(format!("stream from {} failed: {}", url, e)))?;
        file.write_all(&chunk)
            .with_context(|| format!("Failed to write {}", part.display()))?;
    }
    file.flush()?;
    drop(file);

    std::fs::rename(&part, &dest)
        .with_context(|| format!("Failed to move {} into place", part.display()))?;

    info!("Downloaded {}", dest.display());
    Ok(dest)
}
