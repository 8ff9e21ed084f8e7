//! Process-wide configuration.
//!
//! The configuration is loaded exactly once per CLI invocation and
//! passed by reference into each component; nothing in the core
//! re-reads it from disk mid-operation. Stored as JSON at
//! `~/.stratus/config.json` and created with defaults on first run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Stratus API.
    pub url: String,
    /// Bearer token, written by `stratus login`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://api.stratus.dev".to_string(),
            token: None,
        }
    }
}

/// Full CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the terraform executable.
    pub terraform_path: String,
    /// Path to the ansible-playbook executable.
    pub ansible_path: String,
    /// Path to the docker executable.
    pub docker_path: String,
    /// Root directory holding terraform template and app directories.
    pub templates_dir: PathBuf,
    /// Root directory for infrastructure deployment working directories.
    pub deployments_dir: PathBuf,
    /// Root directory for application deployment working directories.
    pub app_deployments_dir: PathBuf,
    /// Serve the built-in demo catalog when the on-disk catalogs are
    /// empty. Never enabled implicitly.
    pub demo_mode: bool,
    /// Default log filter (overridden by RUST_LOG / --verbose).
    pub log_level: String,
    /// Remote API settings.
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        let base = Self::base_dir();
        Self {
            terraform_path: "terraform".to_string(),
            ansible_path: "ansible-playbook".to_string(),
            docker_path: "docker".to_string(),
            templates_dir: base.join("templates"),
            deployments_dir: base.join("deployments"),
            app_deployments_dir: base.join("app_deployments"),
            demo_mode: false,
            log_level: "info".to_string(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Base directory for Stratus state (`~/.stratus`).
    #[must_use]
    pub fn base_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
        PathBuf::from(home).join(".stratus")
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_file() -> PathBuf {
        Self::base_dir().join("config.json")
    }

    /// Load the configuration, creating the file with defaults on
    /// first run. Environment overrides (`STRATUS_API_TOKEN`,
    /// `STRATUS_DEMO_MODE`) are applied after loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created or a
    /// fresh config file cannot be written. An unreadable or corrupt
    /// existing file falls back to defaults with a warning, so a bad
    /// config never bricks the CLI.
    pub fn load() -> Result<Self> {
        let path = Self::config_file();
        let mut config = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    warn!("Invalid config file {}: {e}; using defaults", path.display());
                    Self::default()
                }),
                Err(e) => {
                    warn!("Cannot read config file {}: {e}; using defaults", path.display());
                    Self::default()
                }
            }
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        if let Ok(token) = std::env::var("STRATUS_API_TOKEN") {
            if !token.is_empty() {
                config.api.token = Some(token);
            }
        }
        if std::env::var("STRATUS_DEMO_MODE").as_deref() == Ok("1") {
            config.demo_mode = true;
        }

        Ok(config)
    }

    /// Write the configuration back to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Directory containing terraform template directories.
    #[must_use]
    pub fn terraform_templates_dir(&self) -> PathBuf {
        self.templates_dir.join("terraform")
    }

    /// Directory containing application directories.
    #[must_use]
    pub fn apps_dir(&self) -> PathBuf {
        self.templates_dir.join("apps")
    }

    /// Set a configuration key from its string form, for `config set`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the known keys when `key` is unknown.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "terraform_path" => self.terraform_path = value.to_string(),
            "ansible_path" => self.ansible_path = value.to_string(),
            "docker_path" => self.docker_path = value.to_string(),
            "templates_dir" => self.templates_dir = expand_home(value),
            "deployments_dir" => self.deployments_dir = expand_home(value),
            "app_deployments_dir" => self.app_deployments_dir = expand_home(value),
            "demo_mode" => self.demo_mode = matches!(value, "1" | "true" | "yes"),
            "log_level" => self.log_level = value.to_string(),
            "api.url" => self.api.url = value.to_string(),
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "unknown config key '{key}' (known: terraform_path, ansible_path, \
                         docker_path, templates_dir, deployments_dir, app_deployments_dir, \
                         demo_mode, log_level, api.url)"
                    ),
                )
                .into());
            }
        }
        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
        Path::new(&home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.terraform_path, "terraform");
        assert_eq!(config.ansible_path, "ansible-playbook");
        assert!(!config.demo_mode);
        assert!(config.api.token.is_none());
    }

    #[test]
    fn test_set_key() {
        let mut config = Config::default();
        config.set_key("terraform_path", "/opt/tf/terraform").unwrap();
        assert_eq!(config.terraform_path, "/opt/tf/terraform");

        config.set_key("demo_mode", "true").unwrap();
        assert!(config.demo_mode);

        assert!(config.set_key("no_such_key", "x").is_err());
    }

    #[test]
    fn test_expand_home() {
        std::env::var("HOME").expect("HOME set in test env");
        let expanded = expand_home("~/templates");
        assert!(!expanded.to_string_lossy().contains('~'));
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }

    #[test]
    #[serial_test::serial]
    fn test_load_applies_env_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let old_home = std::env::var("HOME").expect("HOME set in test env");
        std::env::set_var("HOME", tmp.path());
        std::env::set_var("STRATUS_DEMO_MODE", "1");
        std::env::set_var("STRATUS_API_TOKEN", "tok-env");

        let config = Config::load().unwrap();
        assert!(config.demo_mode);
        assert_eq!(config.api.token.as_deref(), Some("tok-env"));
        // First run persists the defaults.
        assert!(Config::config_file().exists());

        std::env::remove_var("STRATUS_DEMO_MODE");
        std::env::remove_var("STRATUS_API_TOKEN");
        std::env::set_var("HOME", old_home);
    }

    #[test]
    fn test_roundtrip_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.terraform_path, config.terraform_path);
        assert_eq!(back.templates_dir, config.templates_dir);
    }
}
