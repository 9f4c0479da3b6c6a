//! Error taxonomy for release resolution and packaging.

/// Failures that abort the packaging pipeline.
///
/// All variants are fatal: there is no retry beyond the rate-limit wait and
/// no partial-success mode. Resolution failures happen before any filesystem
/// mutation, so an aborted run leaves nothing behind.
#[derive(Debug)]
pub enum PackageError {
    /// The upstream API returned something other than the expected shape
    /// (e.g. an error object where a release list was expected), or the
    /// request itself timed out.
    Upstream(String),
    /// No release or asset matched the given criteria.
    NotFound(String),
    /// A download request came back with a non-success HTTP status.
    Download(String),
}

impl std::fmt::Display for PackageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageError::Upstream(msg) => write!(f, "Upstream API error: {}", msg),
            PackageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            PackageError::Download(msg) => write!(f, "Download failed: {}", msg),
        }
    }
}

impl std::error::Error for PackageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_upstream() {
        let err = PackageError::Upstream("rate limited".to_string());
        assert!(err.to_string().contains("Upstream API error"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_display_not_found() {
        let err = PackageError::NotFound("version 9.1".to_string());
        assert!(err.to_string().contains("Not found"));
    }

    #[test]
    fn test_display_download() {
        let err = PackageError::Download("HTTP 404".to_string());
        assert!(err.to_string().contains("Download failed"));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err = anyhow::Error::from(PackageError::NotFound("x".to_string()));
        assert!(err.downcast_ref::<PackageError>().is_some());
    }
}
