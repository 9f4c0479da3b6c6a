//! The packaging pipeline: resolve, stage, install, wrap.

use anyhow::{Context, Result, bail};
use log::info;
use std::path::PathBuf;

use crate::bundle::{self, BundlePaths};
use crate::config::Config;
use crate::dist;
use crate::download;
use crate::github::FetchReleases;
use crate::resolver;
use crate::runtime::Runtime;

/// Distribution format for the finished bundle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Dmg,
    Tar,
}

/// Everything one packaging run needs, assembled from the CLI.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Explicit payload zip URL; skips release resolution.
    pub url: Option<String>,
    /// Local payload zip or pre-extracted directory; skips download.
    pub path: Option<PathBuf>,
    /// Version hint, e.g. "9.1 BETA". Without `url`/`path`, selects the
    /// release to download; always sets the bundle version when given.
    pub version: Option<String>,
    /// Upgrade an existing bundle in place instead of staging the skeleton.
    pub app: Option<PathBuf>,
    /// The pre-built `.app` skeleton to stage from.
    pub skeleton: PathBuf,
    /// JDK zip or directory to bundle.
    pub jdk: Option<PathBuf>,
    /// Bundle the latest GraalVM instead of a plain JDK.
    pub graal: bool,
    /// Extension zips to install into the extracted tree.
    pub extensions: Vec<PathBuf>,
    pub output: OutputFormat,
    /// Where the finished dmg/tarball lands.
    pub out_dir: PathBuf,
}

/// Version labels of all published releases, newest first.
pub async fn list_versions<C: FetchReleases>(client: &C, config: &Config) -> Result<Vec<String>> {
    let releases = client.releases(&config.upstream).await?;
    Ok(resolver::version_labels(&releases))
}

/// Run the packaging pipeline end to end.
///
/// Release resolution happens before anything touches the filesystem, so a
/// failed resolution aborts with the bundle and output directory untouched.
#[tracing::instrument(skip(runtime, releases_client, http, config, opts))]
pub async fn run<R: Runtime, C: FetchReleases>(
    runtime: &R,
    releases_client: &C,
    http: &reqwest::Client,
    config: &Config,
    opts: PackageOptions,
) -> Result<()> {
    let mut version = opts.version.clone();
    let mut url = opts.url.clone();

    if url.is_none() && opts.path.is_none() {
        info!("No URL or path provided, resolving from GitHub");
        let releases = releases_client.releases(&config.upstream).await?;
        let resolved = match &version {
            Some(hint) => resolver::resolve_version(&releases, hint)?,
            None => resolver::resolve_latest(&releases)?,
        };
        info!("Fetching {} from {}", resolved.version, resolved.url);
        version = Some(resolved.version);
        url = Some(resolved.url);
    }

    let staging = tempfile::tempdir().context("Failed to create staging directory")?;

    let paths = if let Some(app) = &opts.app {
        info!("Upgrading bundle in place at {}", app.display());
        BundlePaths::new(app.clone())
    } else {
        bundle::stage_skeleton(runtime, &opts.skeleton, staging.path())?
    };

    let payload = if let Some(url) = &url {
        download::fetch_cached(http, url, &config.cache_dir, None).await?
    } else if let Some(path) = &opts.path {
        info!("Will use payload from {}", path.display());
        if !runtime.exists(path) {
            bail!("Payload path {} does not exist", path.display());
        }
        path.clone()
    } else {
        bail!("Neither path nor url were specified");
    };

    if version.is_none() {
        version = payload
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(bundle::version_from_archive_name);
    }

    if let Some(version) = &version {
        bundle::set_bundle_version(runtime, &paths.contents, version)?;
    }

    bundle::install_payload(runtime, &payload, &paths.resources)?;

    // The launcher depends on this layout; fail here rather than ship a
    // bundle that cannot start.
    let install_dir = bundle::ghidra_install_dir(runtime, &paths.resources, version.as_deref())?;

    if let Some(jdk) = &opts.jdk {
        bundle::install_jdk(runtime, jdk, &paths.resources)?;
    }
    if opts.graal {
        bundle::install_graal(runtime, releases_client, http, config, &paths.resources).await?;
    }

    if !opts.extensions.is_empty() {
        bundle::install_extensions(&install_dir, &opts.extensions)?;
    }

    if opts.app.is_none() {
        let name = dist::volume_name(&config.product_name, version.as_deref());
        match opts.output {
            OutputFormat::Dmg => {
                dist::build_dmg(staging.path(), &name, &opts.out_dir)?;
            }
            OutputFormat::Tar => {
                dist::build_tarball(staging.path(), &name, &opts.out_dir)?;
            }
        }
    }

    Ok(())
}
