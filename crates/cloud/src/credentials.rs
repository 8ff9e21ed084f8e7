//! Per-provider credential store.
//!
//! Credentials persist as a YAML map of provider name to field map in
//! one file under the Stratus base directory. The file is chmod 600 on
//! unix; values are stored as given, no encryption.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::providers::ConnectError;

type FieldMap = BTreeMap<String, String>;

/// On-disk credential store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(flatten)]
    providers: BTreeMap<String, FieldMap>,

    #[serde(skip)]
    path: PathBuf,
}

impl CredentialStore {
    /// Open the store at `path`, starting empty when the file does not
    /// exist. A corrupt file starts empty with a warning rather than
    /// blocking every connect.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConnectError> {
        let path = path.into();
        let mut store = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&content).unwrap_or_else(|e| {
                warn!("Invalid credentials file {}: {e}; starting empty", path.display());
                Self::default()
            })
        } else {
            Self::default()
        };
        store.path = path;
        Ok(store)
    }

    /// Stored fields for one provider.
    #[must_use]
    pub fn get(&self, provider: &str) -> FieldMap {
        self.providers.get(provider).cloned().unwrap_or_default()
    }

    /// Merge fields into one provider's entry. Existing fields not
    /// named in `fields` are kept.
    pub fn set(&mut self, provider: &str, fields: FieldMap) {
        self.providers
            .entry(provider.to_string())
            .or_default()
            .extend(fields);
    }

    /// Drop one provider's entry. Returns whether it existed.
    pub fn remove(&mut self, provider: &str) -> bool {
        self.providers.remove(provider).is_some()
    }

    /// Providers with stored credentials.
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Write the store back to disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self) -> Result<(), ConnectError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(&self.providers)?;
        std::fs::write(&self.path, content)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
