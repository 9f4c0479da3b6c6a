//! Assembling the `.app` bundle: skeleton staging, payload install,
//! VM bundling, and extension install.

mod plist;

pub use plist::set_bundle_version;

use anyhow::{Context, Result, anyhow, bail};
use log::info;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::config::{Config, GRAAL_REPO};
use crate::download;
use crate::error::PackageError;
use crate::github::FetchReleases;
use crate::resolver::{self, AssetPredicate};
use crate::runtime::Runtime;

/// Well-known locations inside an application bundle.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    pub app: PathBuf,
    pub contents: PathBuf,
    pub resources: PathBuf,
}

impl BundlePaths {
    pub fn new(app: PathBuf) -> Self {
        let contents = app.join("Contents");
        let resources = contents.join("Resources");
        Self {
            app,
            contents,
            resources,
        }
    }
}

/// Copy the pre-built `.app` skeleton into the staging directory and put the
/// customary `Applications` symlink next to it for the disk image.
#[tracing::instrument(skip(runtime))]
pub fn stage_skeleton<R: Runtime>(
    runtime: &R,
    skeleton: &Path,
    staging_root: &Path,
) -> Result<BundlePaths> {
    if !runtime.is_dir(skeleton) {
        bail!("App skeleton not found at {}", skeleton.display());
    }

    let app_name = skeleton
        .file_name()
        .ok_or_else(|| anyhow!("Skeleton path has no directory name"))?;
    let app = staging_root.join(app_name);

    runtime.copy_dir(skeleton, &app)?;
    runtime.symlink(Path::new("/Applications"), &staging_root.join("Applications"))?;

    Ok(BundlePaths::new(app))
}

/// Derive the version from a release archive filename.
///
/// Upstream archives are named `ghidra_<version>_<channel>_<date>.zip`;
/// anything that does not follow that convention yields `None`.
pub fn version_from_archive_name(name: &str) -> Option<String> {
    let rest = name.split_once("ghidra_")?.1;
    let version = rest.split('_').next()?;
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

/// Install the payload archive or directory under `Contents/Resources`.
#[tracing::instrument(skip(runtime))]
pub fn install_payload<R: Runtime>(runtime: &R, payload: &Path, resources: &Path) -> Result<()> {
    if runtime.is_dir(payload) {
        let name = payload
            .file_name()
            .ok_or_else(|| anyhow!("Payload path has no directory name"))?;
        info!("Copying {} into bundle...", payload.display());
        runtime.copy_dir(payload, &resources.join(name))?;
    } else {
        info!("Extracting {} into bundle...", payload.display());
        archive::extract_zip(payload, resources)?;
    }
    info!("Installed payload into {}", resources.display());
    Ok(())
}

/// Locate the extracted `ghidra_<version>*` tree under `Contents/Resources`.
///
/// The launcher script depends on this layout, so a missing match means the
/// payload archive was not structured the way upstream releases are.
#[tracing::instrument(skip(runtime))]
pub fn ghidra_install_dir<R: Runtime>(
    runtime: &R,
    resources: &Path,
    version: Option<&str>,
) -> Result<PathBuf> {
    let prefix = match version {
        Some(v) => format!("ghidra_{}", v.split_whitespace().next().unwrap_or(v)),
        None => "ghidra_".to_string(),
    };

    runtime
        .read_dir(resources)?
        .into_iter()
        .find(|p| {
            runtime.is_dir(p)
                && p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
        })
        .ok_or_else(|| {
            anyhow!(
                "Ghidra was not installed into {}, is the Ghidra zip correctly structured?",
                resources.display()
            )
        })
}

/// Bundle a JDK from a zip archive or a directory into `Contents/Resources/jdk`.
#[tracing::instrument(skip(runtime))]
pub fn install_jdk<R: Runtime>(runtime: &R, jdk_source: &Path, resources: &Path) -> Result<()> {
    let jdk_path = resources.join("jdk");
    if runtime.exists(&jdk_path) {
        bail!("A JDK is already bundled at {}", jdk_path.display());
    }

    if runtime.is_dir(jdk_source) {
        info!("Copying JDK from {}...", jdk_source.display());
        runtime.copy_dir(jdk_source, &jdk_path)?;
    } else {
        info!("Extracting JDK from {}...", jdk_source.display());
        let scratch = tempfile::tempdir().context("Failed to create temporary directory")?;
        archive::extract_zip(jdk_source, scratch.path())?;

        // JDK zips wrap everything in a single versioned directory; the
        // bundle wants its contents directly under jdk/.
        let entries = runtime.read_dir(scratch.path())?;
        let root = match entries.as_slice() {
            [single] if runtime.is_dir(single) => single.clone(),
            _ => scratch.path().to_path_buf(),
        };
        runtime.copy_dir(&root, &jdk_path)?;
    }

    info!("Bundled JDK at {}", jdk_path.display());
    Ok(())
}

/// Extract extension zips into the installed tree's `Ghidra/Extensions`.
#[tracing::instrument(skip(extensions))]
pub fn install_extensions(install_dir: &Path, extensions: &[PathBuf]) -> Result<()> {
    let extension_dir = install_dir.join("Ghidra").join("Extensions");
    for extension in extensions {
        info!("Installing extension: {}", extension.display());
        archive::extract_zip(extension, &extension_dir)
            .with_context(|| format!("Failed to install extension {}", extension.display()))?;
    }
    Ok(())
}

/// Resolve, download, and bundle the latest GraalVM into
/// `Contents/Resources/graal`, then point `jdk` at its `Contents/Home` via a
/// relative symlink so the launcher picks it up.
#[tracing::instrument(skip(runtime, releases_client, http, config))]
pub async fn install_graal<R: Runtime, C: FetchReleases>(
    runtime: &R,
    releases_client: &C,
    http: &reqwest::Client,
    config: &Config,
    resources: &Path,
) -> Result<()> {
    let jdk_path = resources.join("jdk");
    let graal_dest = resources.join("graal");

    // A pre-existing jdk would end up shadowed by the symlink; refuse early.
    if runtime.exists(&jdk_path) || runtime.exists(&graal_dest) {
        bail!("Bundle already contains a jdk or graal directory");
    }

    let graal_repo = GRAAL_REPO.parse()?;
    let releases = releases_client.releases(&graal_repo).await?;
    let release = releases
        .first()
        .ok_or_else(|| PackageError::NotFound("no GraalVM releases published".to_string()))?;

    // Release names look like "GraalVM Community Edition 21.3.0".
    let graal_version = release
        .name
        .as_deref()
        .and_then(|n| n.split_whitespace().last())
        .unwrap_or("unknown");

    let asset = resolver::find_asset(
        release,
        &[
            AssetPredicate::EndsWith(".tar.gz".to_string()),
            AssetPredicate::Contains("graalvm-ce-java11".to_string()),
            AssetPredicate::Contains("darwin".to_string()),
        ],
    )?;

    info!("Graal {} @ {}", graal_version, asset.browser_download_url);

    let tar_path = download::fetch_cached(
        http,
        &asset.browser_download_url,
        &config.cache_dir,
        Some(&asset.name),
    )
    .await?;

    // The extracted directory name is the asset name minus the platform tag
    // and archive suffix, e.g. graalvm-ce-java11-21.3.0.
    let dir_name = asset.name.replace("darwin-amd64-", "");
    let dir_name = dir_name.strip_suffix(".tar.gz").unwrap_or(&dir_name).to_string();

    let graal_cached = config.cache_dir.join(&dir_name);
    if !runtime.exists(&graal_cached) {
        archive::extract_tar_gz(&tar_path, &config.cache_dir)?;
    }
    if !runtime.is_dir(&graal_cached) {
        bail!(
            "Graal archive did not extract to the expected {}",
            graal_cached.display()
        );
    }

    info!("Copying Graal into the bundle...");
    runtime.create_dir_all(&graal_dest)?;
    runtime.copy_dir(&graal_cached, &graal_dest.join(&dir_name))?;

    let graal_home = graal_dest.join(&dir_name).join("Contents").join("Home");
    let relative_home = pathdiff::diff_paths(&graal_home, resources)
        .ok_or_else(|| anyhow!("Failed to compute relative path for the jdk symlink"))?;
    runtime.symlink(&relative_home, &jdk_path)?;

    info!("Bundled Graal {} and linked jdk -> {}", graal_version, relative_home.display());
    Ok(())
}
