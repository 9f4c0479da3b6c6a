use std::path::PathBuf;

use crate::github::GitHubRepo;
use crate::runtime::Runtime;

/// Upstream project publishing the Ghidra release archives.
pub const GHIDRA_REPO: &str = "nationalsecurityagency/ghidra";

/// Upstream project publishing GraalVM community builds.
pub const GRAAL_REPO: &str = "graalvm/graalvm-ce-builds";

const CACHE_DIR_NAME: &str = "Ghidra-App-Bundle-Downloads";

/// Explicit configuration passed into the resolver and pipeline.
///
/// There is deliberately no process-wide state: everything the pipeline
/// needs to know about its surroundings lives here and is constructed once
/// in `main`.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub API base URL; `None` means the public endpoint. Overridable
    /// so tests can point at a local mock server.
    pub api_url: Option<String>,
    /// Where downloaded archives are cached between runs.
    pub cache_dir: PathBuf,
    /// Display name of the packaged product ("Ghidra").
    pub product_name: String,
    /// The repository releases are resolved from.
    pub upstream: GitHubRepo,
}

impl Config {
    pub fn new<R: Runtime>(runtime: &R, api_url: Option<String>) -> Self {
        Self {
            api_url,
            cache_dir: default_cache_dir(runtime),
            product_name: "Ghidra".to_string(),
            upstream: GitHubRepo {
                owner: "nationalsecurityagency".to_string(),
                repo: "ghidra".to_string(),
            },
        }
    }

}

/// Prefer a cache under `~/Downloads` when the user has one, otherwise fall
/// back to the system temp directory.
fn default_cache_dir<R: Runtime>(runtime: &R) -> PathBuf {
    if let Some(home) = runtime.home_dir() {
        let downloads = home.join("Downloads");
        if runtime.exists(&downloads) {
            return downloads.join(CACHE_DIR_NAME);
        }
    }
    std::env::temp_dir().join(CACHE_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::path::Path;

    #[test]
    fn test_cache_dir_under_downloads() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        runtime
            .expect_exists()
            .with(mockall::predicate::eq(Path::new("/home/user/Downloads").to_path_buf()))
            .returning(|_| true);

        let config = Config::new(&runtime, None);
        assert_eq!(
            config.cache_dir,
            PathBuf::from("/home/user/Downloads/Ghidra-App-Bundle-Downloads")
        );
    }

    #[test]
    fn test_cache_dir_falls_back_to_temp() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        runtime.expect_exists().returning(|_| false);

        let config = Config::new(&runtime, None);
        assert!(config.cache_dir.starts_with(std::env::temp_dir()));
        assert!(config.cache_dir.ends_with("Ghidra-App-Bundle-Downloads"));
    }

    #[test]
    fn test_no_home_dir_falls_back_to_temp() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| None);
        let config = Config::new(&runtime, None);
        assert!(config.cache_dir.starts_with(std::env::temp_dir()));
    }
}
