//! External tool drivers and the deployment state machines.
//!
//! Each driver wraps one external executable behind the [`ToolDriver`]
//! trait so the state machines dispatch over a trait object instead of
//! matching on tool names. The state machines persist the record state
//! BEFORE each tool invocation; a crash mid-phase leaves the record in
//! the in-progress state, which readers must treat as "possibly still
//! running" rather than failed.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::record::{AppRecord, AppStatus, DeployStatus, DeploymentRecord};
use crate::store;
use crate::{Error, Result};

/// A single tool invocation in a deployment chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Plan,
    Apply,
    Destroy,
    Output,
    Install,
    Uninstall,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::Output => "output",
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        };
        write!(f, "{name}")
    }
}

/// One external tool, invoked per phase inside a working directory.
pub trait ToolDriver {
    /// Short tool name for messages.
    fn name(&self) -> &str;

    /// Verify the executable is present before any phase runs.
    ///
    /// # Errors
    ///
    /// Returns `ToolMissing` when the executable cannot be spawned.
    fn preflight(&self) -> Result<()>;

    /// Run one phase, returning captured stdout.
    ///
    /// # Errors
    ///
    /// Returns `Tool` when the process exits non-zero and
    /// `UnsupportedPhase` when the driver has no command for `phase`.
    fn run(&self, phase: Phase, workdir: &Path) -> Result<String>;
}

/// Spawn `program args` in `workdir` and capture its output.
fn run_tool(program: &str, args: &[&str], workdir: &Path, phase: Phase) -> Result<String> {
    debug!("Running {program} {} in {}", args.join(" "), workdir.display());
    let output = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let detail = if stderr.is_empty() {
        stdout.trim().to_string()
    } else {
        stderr
    };
    Err(Error::Tool { phase, stderr: detail })
}

/// `--version` preflight shared by all drivers.
fn check_installed(program: &str, tool: &str, hint: &str) -> Result<()> {
    let status = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(Error::ToolMissing {
            tool: tool.to_string(),
            hint: hint.to_string(),
        }),
    }
}

/// Driver for the terraform CLI.
pub struct TerraformDriver {
    program: String,
}

impl TerraformDriver {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.terraform_path.clone(),
        }
    }
}

impl ToolDriver for TerraformDriver {
    fn name(&self) -> &str {
        "terraform"
    }

    fn preflight(&self) -> Result<()> {
        check_installed(
            &self.program,
            "terraform",
            "see https://developer.hashicorp.com/terraform/install",
        )
    }

    fn run(&self, phase: Phase, workdir: &Path) -> Result<String> {
        let args: &[&str] = match phase {
            Phase::Init => &["init"],
            Phase::Plan => &["plan", "-out=tfplan"],
            Phase::Apply => &["apply", "-auto-approve", "tfplan"],
            Phase::Destroy => &["destroy", "-auto-approve"],
            Phase::Output => &["output", "-json"],
            Phase::Install | Phase::Uninstall => {
                return Err(Error::UnsupportedPhase {
                    driver: self.name().to_string(),
                    phase,
                })
            }
        };
        run_tool(&self.program, args, workdir, phase)
    }
}

/// Driver for ansible-playbook runs against one target instance.
pub struct AnsibleDriver {
    program: String,
    /// Playbook to run for the install phase, relative to the workdir.
    playbook: String,
    inventory: PathBuf,
    extra_vars: Option<String>,
}

impl AnsibleDriver {
    #[must_use]
    pub fn new(
        config: &Config,
        playbook: String,
        inventory: PathBuf,
        extra_vars: Option<String>,
    ) -> Self {
        Self {
            program: config.ansible_path.clone(),
            playbook,
            inventory,
            extra_vars,
        }
    }
}

impl ToolDriver for AnsibleDriver {
    fn name(&self) -> &str {
        "ansible"
    }

    fn preflight(&self) -> Result<()> {
        check_installed(
            &self.program,
            "ansible-playbook",
            "install the ansible package",
        )
    }

    fn run(&self, phase: Phase, workdir: &Path) -> Result<String> {
        let playbook = match phase {
            Phase::Install => self.playbook.as_str(),
            Phase::Uninstall => "uninstall.yml",
            _ => {
                return Err(Error::UnsupportedPhase {
                    driver: self.name().to_string(),
                    phase,
                })
            }
        };
        let inventory = self.inventory.to_string_lossy().into_owned();
        let mut args = vec![playbook, "-i", inventory.as_str()];
        if let Some(extra) = &self.extra_vars {
            args.push("-e");
            args.push(extra);
        }
        run_tool(&self.program, &args, workdir, phase)
    }
}

/// Driver for docker compose in the staged app directory.
pub struct DockerDriver {
    program: String,
}

impl DockerDriver {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.docker_path.clone(),
        }
    }
}

impl ToolDriver for DockerDriver {
    fn name(&self) -> &str {
        "docker"
    }

    fn preflight(&self) -> Result<()> {
        check_installed(&self.program, "docker", "see https://docs.docker.com/engine/install")
    }

    fn run(&self, phase: Phase, workdir: &Path) -> Result<String> {
        let args: &[&str] = match phase {
            Phase::Install => &["compose", "up", "-d"],
            Phase::Uninstall => &["compose", "down", "-v"],
            _ => {
                return Err(Error::UnsupportedPhase {
                    driver: self.name().to_string(),
                    phase,
                })
            }
        };
        run_tool(&self.program, args, workdir, phase)
    }
}

/// Persist a status change before the matching phase runs.
fn set_deploy_status(dir: &Path, status: DeployStatus) {
    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(status.to_string()));
    store::update(dir, &patch);
}

fn set_app_status(dir: &Path, status: AppStatus) {
    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(status.to_string()));
    store::update(dir, &patch);
}

fn read_deployment(dir: &Path) -> Result<DeploymentRecord> {
    store::read(dir)?
        .ok_or_else(|| Error::DeploymentNotFound(dir.to_string_lossy().into_owned()))
}

fn read_app(dir: &Path) -> Result<AppRecord> {
    store::read(dir)?
        .ok_or_else(|| Error::DeploymentNotFound(dir.to_string_lossy().into_owned()))
}

/// Run a phase with its in-progress and failure states around it.
fn deploy_phase(
    dir: &Path,
    driver: &dyn ToolDriver,
    phase: Phase,
    running: DeployStatus,
    failed: DeployStatus,
) -> Result<String> {
    set_deploy_status(dir, running);
    info!("Running {phase}");
    match driver.run(phase, dir) {
        Ok(stdout) => Ok(stdout),
        Err(e) => {
            set_deploy_status(dir, failed);
            Err(e)
        }
    }
}

/// Drive a prepared deployment to `deployed`.
///
/// The confirmation gate receives the plan output; returning false
/// marks the record `cancelled` and nothing past the plan runs.
/// Cancellation is reported as `Error::Cancelled` so callers can
/// distinguish it from tool failures.
///
/// # Errors
///
/// Tool failures leave the record in the matching `failed_*` state and
/// are returned as `Error::Tool`.
pub fn deploy<F>(dir: &Path, driver: &dyn ToolDriver, mut confirm: F) -> Result<DeploymentRecord>
where
    F: FnMut(&str) -> bool,
{
    driver.preflight()?;
    read_deployment(dir)?;

    deploy_phase(dir, driver, Phase::Init, DeployStatus::Initializing, DeployStatus::FailedInit)?;
    let plan = deploy_phase(
        dir,
        driver,
        Phase::Plan,
        DeployStatus::Planning,
        DeployStatus::FailedPlan,
    )?;

    if !confirm(&plan) {
        set_deploy_status(dir, DeployStatus::Cancelled);
        return Err(Error::Cancelled);
    }

    deploy_phase(dir, driver, Phase::Apply, DeployStatus::Applying, DeployStatus::FailedApply)?;

    // Output capture failing after a successful apply is not a deploy
    // failure; the infrastructure exists either way.
    let outputs = match driver.run(Phase::Output, dir) {
        Ok(raw) => flatten_outputs(&raw),
        Err(e) => {
            debug!("Output capture failed: {e}");
            Map::new()
        }
    };

    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(DeployStatus::Deployed.to_string()));
    patch.insert("deployed_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    patch.insert("outputs".to_string(), Value::Object(outputs));
    store::update(dir, &patch);

    read_deployment(dir)
}

/// Drive a deployed deployment to `destroyed`.
///
/// # Errors
///
/// A tool failure leaves the record in `failed_destroy`.
pub fn destroy(dir: &Path, driver: &dyn ToolDriver) -> Result<DeploymentRecord> {
    driver.preflight()?;
    read_deployment(dir)?;

    deploy_phase(
        dir,
        driver,
        Phase::Destroy,
        DeployStatus::Destroying,
        DeployStatus::FailedDestroy,
    )?;
    set_deploy_status(dir, DeployStatus::Destroyed);
    read_deployment(dir)
}

/// Drive a prepared application to `installed`.
///
/// # Errors
///
/// A tool failure leaves the record in `failed`.
pub fn install_app(dir: &Path, driver: &dyn ToolDriver) -> Result<AppRecord> {
    driver.preflight()?;
    read_app(dir)?;

    set_app_status(dir, AppStatus::Installing);
    info!("Running install");
    if let Err(e) = driver.run(Phase::Install, dir) {
        set_app_status(dir, AppStatus::Failed);
        return Err(e);
    }

    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(AppStatus::Installed.to_string()));
    patch.insert("installed_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    store::update(dir, &patch);
    read_app(dir)
}

/// Drive an installed application to `uninstalled`.
///
/// `driver` is `None` when the application has no uninstall procedure
/// (an ansible app without `uninstall.yml`); the record then moves
/// straight to `uninstalled`.
///
/// # Errors
///
/// A tool failure leaves the record in `failed_uninstall`.
pub fn uninstall_app(dir: &Path, driver: Option<&dyn ToolDriver>) -> Result<AppRecord> {
    read_app(dir)?;

    if let Some(driver) = driver {
        driver.preflight()?;
        set_app_status(dir, AppStatus::Uninstalling);
        info!("Running uninstall");
        if let Err(e) = driver.run(Phase::Uninstall, dir) {
            set_app_status(dir, AppStatus::FailedUninstall);
            return Err(e);
        }
    }

    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(AppStatus::Uninstalled.to_string()));
    patch.insert("uninstalled_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    store::update(dir, &patch);
    read_app(dir)
}

/// Flatten `terraform output -json` into a plain name to value map,
/// unwrapping each output's `value` envelope. Unparseable output
/// yields an empty map.
#[must_use]
pub fn flatten_outputs(raw: &str) -> Map<String, Value> {
    let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(raw) else {
        return Map::new();
    };
    parsed
        .into_iter()
        .map(|(name, entry)| {
            let value = match entry {
                Value::Object(mut obj) => obj.remove("value").unwrap_or(Value::Object(obj)),
                other => other,
            };
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Init.to_string(), "init");
        assert_eq!(Phase::Uninstall.to_string(), "uninstall");
    }

    #[test]
    fn test_flatten_unwraps_value_envelope() {
        let raw = r#"{
            "vpc_id": {"value": "vpc-123", "type": "string", "sensitive": false},
            "web": {"value": {"ip": "1.2.3.4", "id": "i-9"}}
        }"#;
        let flat = flatten_outputs(raw);
        assert_eq!(flat["vpc_id"], "vpc-123");
        assert_eq!(flat["web"], json!({"ip": "1.2.3.4", "id": "i-9"}));
    }

    #[test]
    fn test_flatten_tolerates_garbage() {
        assert!(flatten_outputs("not json").is_empty());
        assert!(flatten_outputs("[1,2]").is_empty());
    }

    #[test]
    fn test_terraform_rejects_app_phases() {
        let config = crate::config::Config::default();
        let driver = TerraformDriver::new(&config);
        let err = driver.run(Phase::Install, Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPhase { .. }));
    }

    #[test]
    fn test_docker_rejects_infra_phases() {
        let config = crate::config::Config::default();
        let driver = DockerDriver::new(&config);
        let err = driver.run(Phase::Plan, Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPhase { .. }));
    }

    #[test]
    fn test_preflight_missing_tool() {
        let config = crate::config::Config {
            terraform_path: "/nonexistent/terraform".to_string(),
            ..crate::config::Config::default()
        };
        let driver = TerraformDriver::new(&config);
        let err = driver.preflight().unwrap_err();
        assert!(matches!(err, Error::ToolMissing { .. }));
    }
}
