//! Archive extraction and creation for the bundle payloads.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::debug;
use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

/// Extract a zip archive into `dest`, keeping the archive's own layout
/// (the Ghidra zip carries a single `ghidra_<ver>_<channel>` root directory
/// that the launcher expects to find under `Contents/Resources`).
#[tracing::instrument]
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting zip archive to {:?}...", dest);

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
    let mut archive = ZipArchive::new(file).context("Failed to parse ZIP archive")?;

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read ZIP entry {}", i))?;

        let entry_path = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                debug!("Skipping entry with invalid path");
                continue;
            }
        };

        let full_path = dest.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&full_path)?;
        } else {
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut dest_file = File::create(&full_path)
                .with_context(|| format!("Failed to create {:?}", full_path))?;
            std::io::copy(&mut entry, &mut dest_file)
                .with_context(|| format!("Failed to extract file {:?}", full_path))?;

            // Launcher scripts inside the archive must stay executable
            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&full_path, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

/// Extract a gzipped tarball into `dest`, preserving permissions and
/// symlinks (the Graal VM distribution relies on both).
#[tracing::instrument]
pub fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<()> {
    debug!("Extracting tar.gz archive to {:?}...", dest);

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
    let decoder = GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.set_preserve_permissions(true);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    archive
        .unpack(dest)
        .with_context(|| format!("Failed to unpack archive into {}", dest.display()))?;

    Ok(())
}

/// Pack the contents of `src_dir` into a gzipped tarball at `dest`.
///
/// Symlinks are stored as symlinks: the staged bundle contains an
/// `Applications -> /Applications` link that must not be followed.
#[tracing::instrument]
pub fn create_tar_gz(src_dir: &Path, dest: &Path) -> Result<()> {
    debug!("Creating tar.gz of {:?} at {:?}...", src_dir, dest);

    let file =
        File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder
        .append_dir_all(".", src_dir)
        .with_context(|| format!("Failed to archive {}", src_dir.display()))?;
    builder
        .into_inner()
        .context("Failed to finish tar archive")?
        .finish()
        .context("Failed to finish gzip stream")?;

    Ok(())
}
