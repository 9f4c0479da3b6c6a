//! Wrapping the staged bundle into a distributable artifact.

use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::archive;

/// The volume / artifact name: `"Ghidra <version>"`, or the bare product
/// name when no version is known.
pub fn volume_name(product: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{} {}", product, v),
        None => product.to_string(),
    }
}

/// Create a disk image of the staging directory.
///
/// Tries `hdiutil` (macOS); when that is unavailable or fails, falls back to
/// `genisoimage`, which produces an HFS-flagged ISO that mounts on macOS.
#[tracing::instrument]
pub fn build_dmg(staging: &Path, name: &str, out_dir: &Path) -> Result<PathBuf> {
    let dmg_path = out_dir.join(format!("{}.dmg", name));
    if dmg_path.exists() {
        std::fs::remove_file(&dmg_path)
            .with_context(|| format!("Failed to remove stale {}", dmg_path.display()))?;
    }

    info!("Building dmg");

    let hdiutil = Command::new("hdiutil")
        .args(["create", "-volname", name, "-fs", "HFS+", "-srcfolder"])
        .arg(staging)
        .arg(&dmg_path)
        .status();

    match hdiutil {
        Ok(status) if status.success() => {}
        result => {
            warn!("hdiutil failed ({:?}), trying genisoimage", result);
            let status = Command::new("genisoimage")
                .args(["-V", name, "-D", "-R", "-apple", "-no-pad", "-o"])
                .arg(&dmg_path)
                .arg(staging)
                .status()
                .context("Failed to run genisoimage (is it installed?)")?;
            if !status.success() {
                bail!("genisoimage exited with {}", status);
            }
        }
    }

    info!("Built {}", dmg_path.display());
    Ok(dmg_path)
}

/// Create a gzipped tarball of the staging directory. Spaces in the name
/// become underscores so the filename stays shell-friendly.
#[tracing::instrument]
pub fn build_tarball(staging: &Path, name: &str, out_dir: &Path) -> Result<PathBuf> {
    let tar_path = out_dir.join(format!("{}.tar.gz", name.replace(' ', "_")));

    info!("Building tar");
    archive::create_tar_gz(staging, &tar_path)?;
    info!("Built {}", tar_path.display());

    Ok(tar_path)
}
