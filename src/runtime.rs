use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Seam between the pipeline and the host system.
///
/// Everything the packaging steps touch on disk or in the environment goes
/// through this trait so the steps can be unit tested against a mock.
#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    fn home_dir(&self) -> Option<PathBuf>;

    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    #[tracing::instrument(skip(self))]
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(skip(self))]
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(skip(self, contents))]
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(path)?.map(|entry| Ok(entry?.path())).collect()
    }

    #[tracing::instrument(skip(self))]
    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::symlink as unix_symlink;
            unix_symlink(original, link).context("Failed to create symlink")?;
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::symlink_dir;
            symlink_dir(original, link).context("Failed to create directory symlink")?;
        }
        Ok(())
    }

    /// Recursive copy that preserves symlinks as symlinks.
    ///
    /// The Graal VM tree contains internal symlinks that must survive the
    /// copy into the bundle or the VM breaks.
    #[tracing::instrument(skip(self))]
    fn copy_dir(&self, from: &Path, to: &Path) -> Result<()> {
        copy_dir_recursive(from, to)
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)
        .with_context(|| format!("Failed to create directory {}", to.display()))?;

    for entry in fs::read_dir(from)
        .with_context(|| format!("Failed to read directory {}", from.display()))?
    {
        let entry = entry?;
        let src = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            let target = fs::read_link(&src)
                .with_context(|| format!("Failed to read symlink {}", src.display()))?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&target, &dest)
                .with_context(|| format!("Failed to create symlink {}", dest.display()))?;
            #[cfg(windows)]
            std::os::windows::fs::symlink_file(&target, &dest)
                .with_context(|| format!("Failed to create symlink {}", dest.display()))?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src, &dest)?;
        } else {
            fs::copy(&src, &dest)
                .with_context(|| format!("Failed to copy {}", src.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_dir_recursive() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        fs::create_dir_all(src.path().join("sub")).unwrap();
        fs::write(src.path().join("top.txt"), b"top").unwrap();
        fs::write(src.path().join("sub/nested.txt"), b"nested").unwrap();

        let runtime = RealRuntime;
        let target = dest.path().join("copy");
        runtime.copy_dir(src.path(), &target).unwrap();

        assert_eq!(fs::read(target.join("top.txt")).unwrap(), b"top");
        assert_eq!(fs::read(target.join("sub/nested.txt")).unwrap(), b"nested");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_preserves_symlinks() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        fs::write(src.path().join("real.txt"), b"data").unwrap();
        std::os::unix::fs::symlink("real.txt", src.path().join("link.txt")).unwrap();

        let runtime = RealRuntime;
        let target = dest.path().join("copy");
        runtime.copy_dir(src.path(), &target).unwrap();

        let link = target.join("link.txt");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("real.txt"));
        assert_eq!(fs::read(&link).unwrap(), b"data");
    }

    #[test]
    fn test_read_dir_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();

        let runtime = RealRuntime;
        let mut entries = runtime.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("a.txt"));
    }
}
