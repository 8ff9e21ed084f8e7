//! Deployment record types.
//!
//! One JSON record (`metadata.json`) lives in each deployment working
//! directory and tracks lifecycle state across CLI invocations. The
//! record's `id` maps 1:1 to its directory; a record without a
//! directory is not a valid deployment.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle states of an infrastructure deployment.
///
/// A successful chain is a strict prefix of
/// `prepared → initializing → planning → applying → deployed`; a
/// failing chain ends in the `failed_*` state matching the phase that
/// exited non-zero. Any non-terminal state observed later means
/// "possibly still running", not failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    /// Working directory staged, nothing run yet.
    Prepared,
    /// `terraform init` in progress.
    Initializing,
    /// `terraform plan` in progress.
    Planning,
    /// `terraform apply` in progress.
    Applying,
    /// Apply succeeded; outputs captured.
    Deployed,
    /// Deployed and later modified outside the deploy chain.
    Updated,
    /// Operator declined the plan. Not a failure.
    Cancelled,
    /// `terraform destroy` in progress.
    Destroying,
    /// Destroy succeeded.
    Destroyed,
    /// init exited non-zero.
    FailedInit,
    /// plan exited non-zero.
    FailedPlan,
    /// apply exited non-zero.
    FailedApply,
    /// destroy exited non-zero.
    FailedDestroy,
}

impl DeployStatus {
    /// Whether instances may be extracted from this deployment.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Deployed | Self::Updated)
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // serde's snake_case name is the canonical wire form.
        let s = serde_json::to_value(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", s.as_str().unwrap_or("unknown"))
    }
}

/// Lifecycle states of an application deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    /// Working directory staged, nothing run yet.
    Prepared,
    /// Install run in progress.
    Installing,
    /// Install succeeded.
    Installed,
    /// Install exited non-zero.
    Failed,
    /// Uninstall run in progress.
    Uninstalling,
    /// Uninstall succeeded.
    Uninstalled,
    /// Uninstall exited non-zero.
    FailedUninstall,
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", s.as_str().unwrap_or("unknown"))
    }
}

/// How an application is delivered to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    /// Installed by running an Ansible playbook against the target.
    #[default]
    Ansible,
    /// Brought up with `docker compose` in the staged directory.
    Docker,
}

impl std::fmt::Display for AppKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ansible => write!(f, "ansible"),
            Self::Docker => write!(f, "docker"),
        }
    }
}

/// Record of an infrastructure deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Unique identifier (UUID v4), immutable, equals the directory name.
    pub id: String,
    /// Logical template reference, e.g. `aws/vpc`.
    pub template: String,
    /// Parameter mapping rendered into the variable file.
    pub params: Map<String, Value>,
    /// Current lifecycle state.
    pub status: DeployStatus,
    /// Creation timestamp (RFC 3339), set once.
    pub created_at: String,
    /// Set once on successful apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<String>,
    /// Flattened terraform outputs, populated only on successful apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Map<String, Value>>,
}

impl DeploymentRecord {
    /// Create a fresh record in the `prepared` state.
    #[must_use]
    pub fn new(id: String, template: String, params: Map<String, Value>) -> Self {
        Self {
            id,
            template,
            params,
            status: DeployStatus::Prepared,
            created_at: chrono::Utc::now().to_rfc3339(),
            deployed_at: None,
            outputs: None,
        }
    }

    /// Platform derived from the template path (`aws/vpc` → `aws`).
    #[must_use]
    pub fn platform(&self) -> Option<&str> {
        self.template.split_once('/').map(|(p, _)| p)
    }
}

/// Reference from an application record to the infrastructure
/// deployment it targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRef {
    /// Instance name as extracted from the deployment outputs.
    pub name: String,
    /// Target address.
    pub ip: String,
    /// Provider-side machine id, when the outputs carried one.
    #[serde(default)]
    pub id: String,
    /// Id of the infrastructure deployment the instance came from.
    pub deployment_id: String,
}

/// Record of an application deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRecord {
    /// Unique identifier (`app-` + 8 hex chars), equals the directory name.
    pub id: String,
    /// Application name from the manifest.
    pub name: String,
    /// Delivery mechanism.
    #[serde(rename = "type")]
    pub kind: AppKind,
    /// Platform the target instance runs on.
    pub platform: String,
    /// Target instance reference.
    pub instance: InstanceRef,
    /// Parameter mapping.
    pub params: Map<String, Value>,
    /// Current lifecycle state.
    pub status: AppStatus,
    /// Creation timestamp (RFC 3339), set once.
    pub created_at: String,
    /// Set once on successful install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
    /// Set once on successful uninstall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstalled_at: Option<String>,
}

impl AppRecord {
    /// Create a fresh record in the `prepared` state.
    #[must_use]
    pub fn new(
        id: String,
        name: String,
        kind: AppKind,
        platform: String,
        instance: InstanceRef,
        params: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            platform,
            instance,
            params,
            status: AppStatus::Prepared,
            created_at: chrono::Utc::now().to_rfc3339(),
            installed_at: None,
            uninstalled_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&DeployStatus::FailedPlan).unwrap(),
            "\"failed_plan\""
        );
        assert_eq!(
            serde_json::to_string(&AppStatus::FailedUninstall).unwrap(),
            "\"failed_uninstall\""
        );
        assert_eq!(DeployStatus::FailedInit.to_string(), "failed_init");
        assert_eq!(AppStatus::Uninstalling.to_string(), "uninstalling");
    }

    #[test]
    fn test_active_statuses() {
        assert!(DeployStatus::Deployed.is_active());
        assert!(DeployStatus::Updated.is_active());
        assert!(!DeployStatus::Destroyed.is_active());
        assert!(!DeployStatus::FailedApply.is_active());
    }

    #[test]
    fn test_platform_from_template() {
        let record = DeploymentRecord::new("x".into(), "aws/vpc".into(), Map::new());
        assert_eq!(record.platform(), Some("aws"));

        let bare = DeploymentRecord::new("x".into(), "vpc".into(), Map::new());
        assert_eq!(bare.platform(), None);
    }

    #[test]
    fn test_app_record_type_key() {
        let record = AppRecord::new(
            "app-12345678".into(),
            "Nextcloud".into(),
            AppKind::Docker,
            "aws".into(),
            InstanceRef {
                name: "web".into(),
                ip: "1.2.3.4".into(),
                id: String::new(),
                deployment_id: "d-1".into(),
            },
            Map::new(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "docker");
        assert_eq!(json["status"], "prepared");
    }
}
