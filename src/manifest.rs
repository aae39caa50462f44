//! Generated Asset Manifests
//!
//! Build tooling emits a small JSON file next to a bundled asset, typically
//! `{"dependencies": [...], "version": "..."}`. The manager merges it into
//! the descriptor's config on every fire, so a rebuilt manifest takes effect
//! without re-registration.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {path} must contain a JSON object")]
    NotAnObject { path: PathBuf },
}

/// Load a manifest file. A missing file is not an error; the caller treats
/// it as "no additional config".
pub fn load_manifest(path: &Path) -> Result<Option<Value>, ManifestError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if !value.is_object() {
        return Err(ManifestError::NotAnObject {
            path: path.to_path_buf(),
        });
    }

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_manifest(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_loads_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.asset.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"dependencies": ["runtime"], "version": "abc123"}}"#).unwrap();

        let manifest = load_manifest(&path).unwrap().unwrap();
        assert_eq!(manifest, json!({"dependencies": ["runtime"], "version": "abc123"}));
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();

        assert!(matches!(
            load_manifest(&path),
            Err(ManifestError::NotAnObject { .. })
        ));
    }
}
