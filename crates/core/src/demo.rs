//! Built-in demo catalog.
//!
//! Served only when `Config::demo_mode` is set and the on-disk app
//! catalog is empty. Lets the CLI be exercised end to end without any
//! templates installed.

use serde_json::json;

use crate::manifest::{AppManifest, Parameter};
use crate::record::AppKind;

/// The three demo applications.
#[must_use]
pub fn demo_apps() -> Vec<AppManifest> {
    vec![
        AppManifest {
            name: "WordPress".to_string(),
            kind: AppKind::Ansible,
            description: "WordPress blog with nginx and MySQL".to_string(),
            platforms: vec!["aws".to_string(), "gcp".to_string(), "azure".to_string()],
            parameters: vec![
                Parameter {
                    name: "domain".to_string(),
                    description: "Site domain name".to_string(),
                    default: Some(json!("localhost")),
                    required: false,
                },
                Parameter {
                    name: "admin_user".to_string(),
                    description: "Administrator account name".to_string(),
                    default: Some(json!("admin")),
                    required: false,
                },
            ],
        },
        AppManifest {
            name: "Nextcloud".to_string(),
            kind: AppKind::Docker,
            description: "Self-hosted file sync and share".to_string(),
            platforms: vec!["aws".to_string(), "gcp".to_string()],
            parameters: vec![Parameter {
                name: "data_dir".to_string(),
                description: "Host directory for user data".to_string(),
                default: Some(json!("/srv/nextcloud")),
                required: false,
            }],
        },
        AppManifest {
            name: "LAMP".to_string(),
            kind: AppKind::Ansible,
            description: "Linux, Apache, MySQL and PHP stack".to_string(),
            platforms: vec!["aws".to_string(), "gcp".to_string(), "azure".to_string()],
            parameters: vec![Parameter {
                name: "php_version".to_string(),
                description: "PHP version to install".to_string(),
                default: Some(json!("8.2")),
                required: false,
            }],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_apps_have_defaults_for_all_params() {
        for app in demo_apps() {
            for param in &app.parameters {
                assert!(
                    param.default.is_some(),
                    "demo param {}.{} needs a default",
                    app.name,
                    param.name
                );
                assert!(!param.required);
            }
        }
    }

    #[test]
    fn test_demo_catalog_kinds() {
        let apps = demo_apps();
        assert_eq!(apps.len(), 3);
        assert!(apps
            .iter()
            .any(|a| a.name == "Nextcloud" && a.kind == AppKind::Docker));
    }
}
