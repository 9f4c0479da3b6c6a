use anyhow::{Context, Result, anyhow};
use log::info;
use std::path::Path;

use crate::runtime::Runtime;

/// Rewrite `CFBundleVersion` in the bundle's `Info.plist`.
///
/// Only the first whitespace-delimited token of the label is recorded:
/// "9.1 BETA" becomes "9.1", which is what Finder expects in the field.
#[tracing::instrument(skip(runtime))]
pub fn set_bundle_version<R: Runtime>(
    runtime: &R,
    contents_dir: &Path,
    version: &str,
) -> Result<()> {
    let path = contents_dir.join("Info.plist");
    let short = version.split_whitespace().next().unwrap_or(version);

    info!("Setting bundle version to {}", short);

    let bytes = runtime.read(&path)?;
    let mut value = plist::Value::from_reader(std::io::Cursor::new(bytes))
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let dict = value
        .as_dictionary_mut()
        .ok_or_else(|| anyhow!("{} root is not a dictionary", path.display()))?;
    dict.insert(
        "CFBundleVersion".to_string(),
        plist::Value::String(short.to_string()),
    );

    let mut buf = Vec::new();
    value
        .to_writer_xml(&mut buf)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    runtime.write(&path, &buf)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;

    const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleName</key>
    <string>Ghidra</string>
    <key>CFBundleVersion</key>
    <string>0.0</string>
</dict>
</plist>"#;

    fn read_version(path: &Path) -> String {
        let value = plist::Value::from_file(path).unwrap();
        value
            .as_dictionary()
            .unwrap()
            .get("CFBundleVersion")
            .unwrap()
            .as_string()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_set_bundle_version() {
        let dir = tempfile::tempdir().unwrap();
        let plist_path = dir.path().join("Info.plist");
        std::fs::write(&plist_path, INFO_PLIST).unwrap();

        set_bundle_version(&RealRuntime, dir.path(), "10.1.2").unwrap();

        assert_eq!(read_version(&plist_path), "10.1.2");

        // Unrelated keys survive the round trip.
        let value = plist::Value::from_file(&plist_path).unwrap();
        assert_eq!(
            value.as_dictionary().unwrap().get("CFBundleName").unwrap().as_string(),
            Some("Ghidra")
        );
    }

    #[test]
    fn test_set_bundle_version_takes_first_token() {
        let dir = tempfile::tempdir().unwrap();
        let plist_path = dir.path().join("Info.plist");
        std::fs::write(&plist_path, INFO_PLIST).unwrap();

        set_bundle_version(&RealRuntime, dir.path(), "9.1 BETA").unwrap();

        assert_eq!(read_version(&plist_path), "9.1");
    }

    #[test]
    fn test_set_bundle_version_missing_plist() {
        let dir = tempfile::tempdir().unwrap();
        let result = set_bundle_version(&RealRuntime, dir.path(), "10.0");
        assert!(result.is_err());
    }
}
