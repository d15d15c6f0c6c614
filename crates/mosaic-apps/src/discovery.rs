//! Manifest discovery from app directories.
//!
//! Each immediate subdirectory of a root that contains a `manifest.json`
//! is treated as one app. A broken manifest is reported and skipped; it
//! never prevents the others from loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::manifest::{AppManifest, AppManifestRecord};

/// Standard manifest file name.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Result of scanning one or more roots.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Valid manifests with the directory each was found in, ordered by
    /// app name.
    pub records: Vec<(AppManifestRecord, PathBuf)>,
    /// Manifests that could not be read, parsed or validated.
    pub failures: Vec<(PathBuf, RegistryError)>,
}

/// Discover manifests under the given roots.
///
/// Roots that do not exist are skipped. When two roots provide the same
/// app name, the later root wins.
pub fn discover_manifests<P: AsRef<Path>>(roots: &[P]) -> Discovery {
    let mut found: BTreeMap<String, (AppManifestRecord, PathBuf)> = BTreeMap::new();
    let mut failures = Vec::new();

    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            debug!(path = %root.display(), "Skipping missing app root");
            continue;
        }
        info!(path = %root.display(), "Discovering apps");

        for app_dir in app_dirs(root, &mut failures) {
            let manifest_path = app_dir.join(MANIFEST_FILE_NAME);
            if !manifest_path.is_file() {
                continue;
            }
            match load_manifest(&manifest_path) {
                Ok(record) => {
                    debug!(
                        path = %manifest_path.display(),
                        app = %record.name(),
                        "Loaded app manifest"
                    );
                    let key = record.name().to_string();
                    if let Some((_, shadowed)) = found.insert(key, (record, app_dir)) {
                        debug!(shadowed = %shadowed.display(), "App overridden by later root");
                    }
                },
                Err(e) => {
                    warn!(path = %manifest_path.display(), error = %e, "Failed to load app manifest");
                    failures.push((manifest_path, e));
                },
            }
        }
    }

    let records: Vec<_> = found.into_values().collect();
    info!(count = records.len(), failed = failures.len(), "Discovered app manifests");
    Discovery { records, failures }
}

/// Load and validate a single manifest file.
///
/// # Errors
///
/// Returns [`RegistryError::ManifestRead`] if the file cannot be read,
/// [`RegistryError::ManifestParse`] if it is not valid JSON, or
/// [`RegistryError::InvalidManifest`] if validation fails.
pub fn load_manifest(path: &Path) -> RegistryResult<AppManifestRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| RegistryError::ManifestRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let manifest = AppManifest::from_json(&content).map_err(|e| RegistryError::ManifestParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    manifest.validate()
}

fn app_dirs(root: &Path, failures: &mut Vec<(PathBuf, RegistryError)>) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %root.display(), error = %e, "Failed to read app root");
            failures.push((
                root.to_path_buf(),
                RegistryError::ManifestRead {
                    path: root.to_path_buf(),
                    message: e.to_string(),
                },
            ));
            return Vec::new();
        },
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_app(root: &Path, dir: &str, manifest: &str) {
        let app_dir = root.join(dir);
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join(MANIFEST_FILE_NAME), manifest).unwrap();
    }

    fn manifest(name: &str, entrypoint: &str) -> String {
        format!(r#"{{ "name": "{name}", "entrypoint": "{entrypoint}", "version": "1.0.0" }}"#)
    }

    #[test]
    fn test_discovers_valid_manifests() {
        let root = tempfile::tempdir().unwrap();
        write_app(root.path(), "clock", &manifest("clock", "clock.qml"));
        write_app(root.path(), "notes", &manifest("notes", "notes.qml"));
        fs::create_dir_all(root.path().join("empty")).unwrap();

        let discovery = discover_manifests(&[root.path()]);
        assert!(discovery.failures.is_empty());

        let names: Vec<_> = discovery
            .records
            .iter()
            .map(|(r, _)| r.name().as_str())
            .collect();
        assert_eq!(names, vec!["clock", "notes"]);
        assert_eq!(discovery.records[0].1, root.path().join("clock"));
    }

    #[test]
    fn test_malformed_manifest_does_not_abort_discovery() {
        let root = tempfile::tempdir().unwrap();
        write_app(root.path(), "broken", "{ not json");
        write_app(root.path(), "invalid", &manifest("Invalid Name", "a.qml"));
        write_app(root.path(), "notes", &manifest("notes", "notes.qml"));

        let discovery = discover_manifests(&[root.path()]);
        assert_eq!(discovery.records.len(), 1);
        assert_eq!(discovery.failures.len(), 2);

        let broken = root.path().join("broken").join(MANIFEST_FILE_NAME);
        assert!(discovery.failures.iter().any(|(path, err)| {
            path == &broken && matches!(err, RegistryError::ManifestParse { .. })
        }));
        assert!(
            discovery
                .failures
                .iter()
                .any(|(_, err)| matches!(err, RegistryError::InvalidManifest { .. }))
        );
    }

    #[test]
    fn test_later_root_overrides_earlier() {
        let system = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        write_app(system.path(), "notes", &manifest("notes", "system.qml"));
        write_app(user.path(), "notes", &manifest("notes", "user.qml"));

        let discovery = discover_manifests(&[system.path(), user.path()]);
        assert_eq!(discovery.records.len(), 1);
        assert_eq!(discovery.records[0].0.entrypoint(), "user.qml");
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");

        let discovery = discover_manifests(&[missing]);
        assert!(discovery.records.is_empty());
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn test_load_manifest_missing_file() {
        let root = tempfile::tempdir().unwrap();
        let err = load_manifest(&root.path().join(MANIFEST_FILE_NAME)).unwrap_err();
        assert!(matches!(err, RegistryError::ManifestRead { .. }));
    }
}
