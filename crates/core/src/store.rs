//! Per-deployment metadata persistence.
//!
//! Every deployment working directory carries a `metadata.json`
//! record. All operations here hit the filesystem synchronously and
//! nothing is cached: a fresh CLI process always observes the latest
//! state. Writes go through a temp file plus atomic rename so a crash
//! mid-write can never tear the record. There is deliberately no
//! cross-process lock: two concurrent invocations mutating the same
//! deployment can still lose an update (documented limitation, see
//! DESIGN.md).

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::Result;

/// Record file name inside each deployment directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Write the initial record for a freshly materialized deployment.
///
/// # Errors
///
/// Returns an `Io` error if the directory does not exist or is not
/// writable.
pub fn create<T: Serialize>(deployment_dir: &Path, record: &T) -> Result<()> {
    if !deployment_dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("deployment directory {} does not exist", deployment_dir.display()),
        )
        .into());
    }
    write_atomic(deployment_dir, &serde_json::to_value(record)?)
}

/// Read the record for a deployment directory.
///
/// Returns `Ok(None)` when no record file exists; callers must treat
/// that as "unknown deployment", not as an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read<T: DeserializeOwned>(deployment_dir: &Path) -> Result<Option<T>> {
    let path = deployment_dir.join(METADATA_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Shallow-merge `patch` into the existing record: each top-level key
/// in the patch overwrites its counterpart, siblings are untouched.
///
/// Metadata update failure is non-fatal to the surrounding operation
/// (the external tool may already have committed real-world side
/// effects), so failures are logged and reported by the return value
/// rather than raised.
pub fn update(deployment_dir: &Path, patch: &Map<String, Value>) -> bool {
    let path = deployment_dir.join(METADATA_FILE);
    let current = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Cannot read record {}: {e}", path.display());
            return false;
        }
    };

    let mut record: Value = match serde_json::from_str(&current) {
        Ok(value) => value,
        Err(e) => {
            warn!("Malformed record {}: {e}", path.display());
            return false;
        }
    };

    match record.as_object_mut() {
        Some(map) => {
            for (key, value) in patch {
                map.insert(key.clone(), value.clone());
            }
        }
        None => {
            warn!("Record {} is not a JSON object", path.display());
            return false;
        }
    }

    if let Err(e) = write_atomic(deployment_dir, &record) {
        warn!("Cannot write record {}: {e}", path.display());
        return false;
    }
    true
}

/// Read every record under `root`: one immediate subdirectory per
/// deployment. Subdirectories with a missing or malformed record are
/// skipped with a warning, never an abort. Results are ordered by
/// directory name for stable listings.
#[must_use]
pub fn list<T: DeserializeOwned>(root: &Path) -> Vec<T> {
    let mut records = Vec::new();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(_) => return records,
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        match read::<T>(&dir) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => warn!("No record in {}; skipping", dir.display()),
            Err(e) => warn!("Unreadable record in {}: {e}; skipping", dir.display()),
        }
    }
    records
}

/// Resolve a deployment id to its working directory, if it exists.
#[must_use]
pub fn deployment_dir(root: &Path, id: &str) -> Option<PathBuf> {
    let dir = root.join(id);
    dir.is_dir().then_some(dir)
}

/// Serialize `record` to `metadata.json` via temp file + rename.
fn write_atomic(deployment_dir: &Path, record: &Value) -> Result<()> {
    let tmp = deployment_dir.join(".metadata.json.tmp");
    let path = deployment_dir.join(METADATA_FILE);
    std::fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DeployStatus, DeploymentRecord};
    use serde_json::json;

    fn sample_record(id: &str) -> DeploymentRecord {
        DeploymentRecord::new(id.to_string(), "aws/vpc".to_string(), Map::new())
    }

    #[test]
    fn test_create_requires_directory() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(create(&missing, &sample_record("d1")).is_err());
    }

    #[test]
    fn test_create_then_read() {
        let dir = tempfile::tempdir().unwrap();
        create(dir.path(), &sample_record("d1")).unwrap();

        let record: DeploymentRecord = read(dir.path()).unwrap().unwrap();
        assert_eq!(record.id, "d1");
        assert_eq!(record.status, DeployStatus::Prepared);
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let record: Option<DeploymentRecord> = read(dir.path()).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_update_merges_shallow() {
        let dir = tempfile::tempdir().unwrap();
        create(dir.path(), &sample_record("d1")).unwrap();

        let mut patch = Map::new();
        patch.insert("status".to_string(), json!("deployed"));
        patch.insert("outputs".to_string(), json!({"web_ip": "1.2.3.4"}));
        assert!(update(dir.path(), &patch));

        let record: DeploymentRecord = read(dir.path()).unwrap().unwrap();
        assert_eq!(record.status, DeployStatus::Deployed);
        assert_eq!(record.outputs.unwrap()["web_ip"], "1.2.3.4");
        // Siblings untouched.
        assert_eq!(record.template, "aws/vpc");
    }

    #[test]
    fn test_update_missing_record_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let mut patch = Map::new();
        patch.insert("status".to_string(), json!("deployed"));
        assert!(!update(dir.path(), &patch));
    }

    #[test]
    fn test_update_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        create(dir.path(), &sample_record("d1")).unwrap();
        let mut patch = Map::new();
        patch.insert("status".to_string(), json!("initializing"));
        assert!(update(dir.path(), &patch));
        assert!(!dir.path().join(".metadata.json.tmp").exists());
    }

    #[test]
    fn test_list_skips_malformed() {
        let root = tempfile::tempdir().unwrap();

        let good = root.path().join("d1");
        std::fs::create_dir(&good).unwrap();
        create(&good, &sample_record("d1")).unwrap();

        let bad = root.path().join("d2");
        std::fs::create_dir(&bad).unwrap();
        std::fs::write(bad.join(METADATA_FILE), "{not json").unwrap();

        let empty = root.path().join("d3");
        std::fs::create_dir(&empty).unwrap();

        let records: Vec<DeploymentRecord> = list(root.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "d1");
    }

    #[test]
    fn test_list_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        for id in ["a1", "b2", "c3"] {
            let dir = root.path().join(id);
            std::fs::create_dir(&dir).unwrap();
            create(&dir, &sample_record(id)).unwrap();
        }

        let first: Vec<DeploymentRecord> = list(root.path());
        let second: Vec<DeploymentRecord> = list(root.path());
        let ids = |records: &[DeploymentRecord]| {
            records.iter().map(|r| r.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_deployment_dir_lookup() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("d1");
        std::fs::create_dir(&dir).unwrap();

        assert_eq!(deployment_dir(root.path(), "d1"), Some(dir));
        assert_eq!(deployment_dir(root.path(), "d2"), None);
    }
}
