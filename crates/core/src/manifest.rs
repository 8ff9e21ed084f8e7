//! Declarative manifests for templates and applications.
//!
//! Each deployable template directory (`<templates>/terraform/<provider>/<name>/`)
//! and each application directory (`<templates>/apps/<name>/`) carries a
//! `manifest.yaml` describing it. Manifests are read-only at runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::demo;
use crate::record::AppKind;
use crate::Result;

/// Manifest file name inside a template or app directory.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// One declared parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

/// Manifest of an infrastructure template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    #[serde(default = "unknown_provider")]
    pub provider: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

fn unknown_provider() -> String {
    "unknown".to_string()
}

/// Manifest of an installable application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AppKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Catalog entry for `deploy list`.
#[derive(Debug, Clone)]
pub struct TemplateSummary {
    pub name: String,
    pub provider: String,
    pub description: String,
    /// Relative path under the terraform templates root, e.g. `aws/vpc`.
    pub path: String,
}

/// Parse a manifest file of either shape.
fn read_manifest<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Scan the terraform templates root for directories carrying a
/// manifest. Unreadable manifests are skipped with a warning.
#[must_use]
pub fn available_templates(config: &Config) -> Vec<TemplateSummary> {
    let root = config.terraform_templates_dir();
    let mut summaries = Vec::new();
    scan_for_manifests(&root, &root, &mut summaries);
    summaries.sort_by(|a, b| a.path.cmp(&b.path));
    summaries
}

fn scan_for_manifests(root: &Path, dir: &Path, out: &mut Vec<TemplateSummary>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let manifest_path = dir.join(MANIFEST_FILE);
    if manifest_path.is_file() {
        match read_manifest::<TemplateManifest>(&manifest_path) {
            Ok(manifest) => {
                let rel = dir
                    .strip_prefix(root)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                out.push(TemplateSummary {
                    name: manifest.name,
                    provider: manifest.provider,
                    description: manifest.description,
                    path: rel,
                });
            }
            Err(e) => warn!("Skipping manifest {}: {e}", manifest_path.display()),
        }
        return;
    }

    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            scan_for_manifests(root, &path, out);
        }
    }
}

/// Look up a template manifest by its relative path (`aws/vpc`).
/// Returns `None` when the directory or its manifest is missing.
#[must_use]
pub fn template_info(config: &Config, template_path: &str) -> Option<TemplateManifest> {
    let manifest_path = config
        .terraform_templates_dir()
        .join(template_path)
        .join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return None;
    }
    match read_manifest(&manifest_path) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!("Unreadable manifest {}: {e}", manifest_path.display());
            None
        }
    }
}

/// Directory holding a template's content files.
#[must_use]
pub fn template_dir(config: &Config, template_path: &str) -> PathBuf {
    config.terraform_templates_dir().join(template_path)
}

/// List installable applications. When the on-disk catalog is empty
/// and `demo_mode` is set, the built-in demo catalog is served instead.
#[must_use]
pub fn available_apps(config: &Config) -> Vec<AppManifest> {
    let mut apps = Vec::new();
    let root = config.apps_dir();
    if let Ok(entries) = std::fs::read_dir(&root) {
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let manifest_path = dir.join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                continue;
            }
            match read_manifest::<AppManifest>(&manifest_path) {
                Ok(manifest) => apps.push(manifest),
                Err(e) => warn!("Skipping manifest {}: {e}", manifest_path.display()),
            }
        }
    }

    if apps.is_empty() && config.demo_mode {
        return demo::demo_apps();
    }
    apps
}

/// Look up an application by name, case-insensitively.
#[must_use]
pub fn app_info(config: &Config, name: &str) -> Option<AppManifest> {
    available_apps(config)
        .into_iter()
        .find(|app| app.name.eq_ignore_ascii_case(name))
}

/// Directory holding an application's content files.
#[must_use]
pub fn app_dir(config: &Config, app: &AppManifest) -> PathBuf {
    config.apps_dir().join(app.name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &Path) -> Config {
        Config {
            templates_dir: root.to_path_buf(),
            ..Config::default()
        }
    }

    fn write_manifest(dir: &Path, yaml: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), yaml).unwrap();
    }

    #[test]
    fn test_template_scan_and_info() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        write_manifest(
            &tmp.path().join("terraform/aws/vpc"),
            "name: VPC\nprovider: aws\ndescription: AWS VPC\nparameters:\n  - name: region\n    required: true\n    default: us-east-1\n",
        );
        write_manifest(
            &tmp.path().join("terraform/gcp/vm"),
            "name: VM\nprovider: gcp\n",
        );

        let templates = available_templates(&config);
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].path, "aws/vpc");
        assert_eq!(templates[1].provider, "gcp");

        let info = template_info(&config, "aws/vpc").unwrap();
        assert_eq!(info.parameters.len(), 1);
        assert!(info.parameters[0].required);
        assert_eq!(info.parameters[0].default, Some("us-east-1".into()));

        assert!(template_info(&config, "aws/missing").is_none());
    }

    #[test]
    fn test_template_scan_skips_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        write_manifest(&tmp.path().join("terraform/aws/good"), "name: Good\nprovider: aws\n");
        write_manifest(&tmp.path().join("terraform/aws/bad"), ": not yaml [");

        let templates = available_templates(&config);
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Good");
    }

    #[test]
    fn test_app_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        write_manifest(
            &tmp.path().join("apps/nextcloud"),
            "name: Nextcloud\ntype: docker\nplatforms: [aws, gcp]\nparameters:\n  - name: domain\n    required: true\n",
        );

        let apps = available_apps(&config);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].kind, AppKind::Docker);

        assert!(app_info(&config, "NEXTCLOUD").is_some());
        assert!(app_info(&config, "wordpress").is_none());
    }

    #[test]
    fn test_empty_catalog_without_demo_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        assert!(available_apps(&config).is_empty());
    }

    #[test]
    fn test_demo_catalog_only_behind_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            demo_mode: true,
            ..test_config(tmp.path())
        };
        let apps = available_apps(&config);
        assert!(!apps.is_empty());
        assert!(apps.iter().any(|a| a.name == "WordPress"));
    }
}
