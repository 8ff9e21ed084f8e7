use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use tracing::debug;

use stratus_core::driver::{self, AnsibleDriver, DockerDriver, ToolDriver};
use stratus_core::record::{AppKind, AppRecord, InstanceRef};
use stratus_core::resolver::TemplateResolver;
use stratus_core::{instances, inventory, manifest, materializer, store, Config, Error};

use crate::ui;

/// Install and manage applications
#[derive(Args)]
pub struct AppCommand {
    #[command(subcommand)]
    action: AppAction,
}

#[derive(Subcommand)]
enum AppAction {
    /// List installable applications
    List,

    /// Install an application on a deployed instance
    Install {
        /// Application name
        name: String,

        /// Only consider instances on this platform
        #[arg(long)]
        platform: Option<String>,

        /// Application parameter, repeatable (key=value)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// SSH user for ansible runs
        #[arg(long, default_value = "root")]
        user: String,

        /// SSH private key file for ansible runs
        #[arg(long)]
        ssh_key: Option<String>,

        /// Skip the target confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Uninstall an application deployment
    Uninstall {
        /// Application deployment id (app-xxxxxxxx)
        id: String,

        /// Uninstall without confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show application deployments
    Status {
        /// Show one deployment in detail
        #[arg(long)]
        id: Option<String>,
    },
}

impl AppCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        match &self.action {
            AppAction::List => list_apps(config),
            AppAction::Install {
                name,
                platform,
                params,
                user,
                ssh_key,
                yes,
            } => install(config, name, platform.as_deref(), params, user, ssh_key.as_deref(), *yes),
            AppAction::Uninstall { id, yes } => uninstall(config, id, *yes),
            AppAction::Status { id } => status(config, id.as_deref()),
        }
    }
}

fn list_apps(config: &Config) -> Result<()> {
    let apps = manifest::available_apps(config);
    if apps.is_empty() {
        ui::print_warning("No applications available");
        ui::print_info(&format!(
            "Add application directories under {}",
            config.apps_dir().display()
        ));
        return Ok(());
    }

    ui::print_section("Available applications");
    for app in &apps {
        println!(
            "  {:<16} {:<8} {}",
            app.name.bold(),
            app.kind.to_string().cyan(),
            app.description.bright_black()
        );
        if !app.platforms.is_empty() {
            println!("  {:<16} {}", "", app.platforms.join(", ").bright_black());
        }
    }
    Ok(())
}

/// Pick the target instance per the selection contract: none found
/// gives a hint, one candidate asks for confirmation, several offer an
/// index selection.
fn select_instance(
    config: &Config,
    platform: Option<&str>,
    yes: bool,
) -> Result<Option<InstanceRef>> {
    let candidates = instances::running_instances(config, platform);
    match candidates.len() {
        0 => {
            ui::print_warning("No running instances found");
            ui::print_info("Deploy infrastructure first: stratus deploy run <template>");
            Ok(None)
        }
        1 => {
            let instance = &candidates[0];
            if yes {
                return Ok(Some(instance.clone()));
            }
            let proceed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Install on {} ({})?", instance.name, instance.ip))
                .default(true)
                .interact()?;
            Ok(proceed.then(|| instance.clone()))
        }
        _ => {
            let labels: Vec<String> = candidates
                .iter()
                .map(|i| format!("{} ({})", i.name, i.ip))
                .collect();
            let index = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Select target instance")
                .items(&labels)
                .default(0)
                .interact()?;
            Ok(Some(candidates[index].clone()))
        }
    }
}

/// Locate the install playbook inside a staged ansible app directory,
/// staging the packaged one when the catalog entry has no files of its
/// own (demo apps).
fn ensure_playbook(dir: &Path, app_name: &str) -> Result<String> {
    for candidate in ["install.yml", "install.yaml", "playbook.yml"] {
        if dir.join(candidate).is_file() {
            return Ok(candidate.to_string());
        }
    }

    let resolver = TemplateResolver::from_env();
    let resolved = resolver
        .resolve(&app_name.to_lowercase(), Some("apps"))
        .with_context(|| format!("no install playbook for '{app_name}'"))?;
    std::fs::write(dir.join("install.yml"), resolved.content)?;
    Ok("install.yml".to_string())
}

/// Same for docker apps: make sure the staged directory holds a
/// compose file before anything runs against it, staging the packaged
/// one for catalog-only apps. Apps with neither fail here, before any
/// tool is invoked.
fn ensure_compose(dir: &Path, app_name: &str) -> Result<()> {
    for candidate in [
        "docker-compose.yml",
        "docker-compose.yaml",
        "compose.yml",
        "compose.yaml",
    ] {
        if dir.join(candidate).is_file() {
            return Ok(());
        }
    }

    let resolver = TemplateResolver::from_env();
    let resolved = resolver
        .resolve(&app_name.to_lowercase(), Some("apps"))
        .with_context(|| format!("no compose file for '{app_name}'"))?;
    std::fs::write(dir.join("docker-compose.yml"), resolved.content)?;
    Ok(())
}

fn install(
    config: &Config,
    name: &str,
    platform: Option<&str>,
    params: &[String],
    user: &str,
    ssh_key: Option<&str>,
    yes: bool,
) -> Result<()> {
    let Some(app) = manifest::app_info(config, name) else {
        bail!("application '{name}' not found, see 'stratus app list'");
    };

    if let Some(platform) = platform {
        if !app.platforms.is_empty() && !app.platforms.iter().any(|p| p == platform) {
            ui::print_warning(&format!(
                "{} is not verified on {platform} (verified: {})",
                app.name,
                app.platforms.join(", ")
            ));
        }
    }

    let Some(instance) = select_instance(config, platform, yes)? else {
        return Ok(());
    };
    let platform = platform.map(str::to_string).unwrap_or_else(|| {
        // Fall back to the platform recorded on the instance's deployment.
        store::deployment_dir(&config.deployments_dir, &instance.deployment_id)
            .and_then(|dir| store::read::<stratus_core::record::DeploymentRecord>(&dir).ok())
            .flatten()
            .and_then(|r| r.platform().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string())
    });

    let params = super::parse_params(params)?;

    debug!("Staging {} ({}) for {}", app.name, app.kind, instance.ip);
    ui::print_section(&format!("Installing {}", app.name));
    ui::print_step("Staging working directory");
    let prepared = materializer::prepare_app(config, &app, instance.clone(), &platform, &params)
        .context("failed to stage the application")?;
    ui::print_detail("id", &prepared.record.id);

    let pb = ui::spinner(&format!("Installing {} on {}", app.name, instance.ip));
    let result = match app.kind {
        AppKind::Ansible => {
            let playbook = ensure_playbook(&prepared.dir, &app.name)?;
            let hosts = inventory::write_inventory(&instance, user, ssh_key)?;
            let extra_vars = if prepared.record.params.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&prepared.record.params)?)
            };
            let driver =
                AnsibleDriver::new(config, playbook, hosts.path().to_path_buf(), extra_vars);
            let result = driver::install_app(&prepared.dir, &driver);
            drop(hosts);
            result
        }
        AppKind::Docker => match ensure_compose(&prepared.dir, &app.name) {
            Ok(()) => {
                let driver = DockerDriver::new(config);
                driver::install_app(&prepared.dir, &driver)
            }
            Err(e) => {
                ui::finish_spinner(&pb, "failed");
                ui::print_error("Install failed");
                return Err(e);
            }
        },
    };

    match result {
        Ok(record) => {
            ui::finish_spinner(&pb, "done");
            ui::print_success(&format!("Installed {} ({})", record.name, record.id));
            Ok(())
        }
        Err(e) => {
            ui::finish_spinner(&pb, "failed");
            ui::print_error("Install failed");
            Err(e.into())
        }
    }
}

fn uninstall(config: &Config, id: &str, yes: bool) -> Result<()> {
    debug!("Uninstalling app deployment {id}");
    let dir = store::deployment_dir(&config.app_deployments_dir, id)
        .ok_or_else(|| Error::DeploymentNotFound(id.to_string()))?;
    let record: AppRecord =
        store::read(&dir)?.ok_or_else(|| Error::DeploymentNotFound(id.to_string()))?;

    if !yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Uninstall {} ({})?", record.name, record.id))
            .default(false)
            .interact()?;
        if !proceed {
            println!("{}", "Uninstall cancelled.".yellow());
            return Ok(());
        }
    }

    let docker;
    let ansible;
    let driver: Option<&dyn ToolDriver> = match record.kind {
        AppKind::Docker => {
            docker = DockerDriver::new(config);
            Some(&docker)
        }
        AppKind::Ansible if dir.join("uninstall.yml").is_file() => {
            let hosts = inventory::write_inventory(&record.instance, "root", None)?;
            // Keep the inventory alive for the run below.
            let path = hosts.path().to_path_buf();
            ansible = (
                AnsibleDriver::new(config, "uninstall.yml".into(), path, None),
                hosts,
            );
            Some(&ansible.0)
        }
        AppKind::Ansible => None,
    };

    let record = driver::uninstall_app(&dir, driver)?;
    ui::print_success(&format!("Uninstalled {} ({})", record.name, record.id));
    Ok(())
}

fn status(config: &Config, id: Option<&str>) -> Result<()> {
    let records: Vec<AppRecord> = store::list(&config.app_deployments_dir);

    if let Some(id) = id {
        let Some(record) = records.iter().find(|r| r.id == id) else {
            bail!("application deployment '{id}' not found");
        };
        ui::print_section(&record.name);
        ui::print_detail("id", &record.id);
        ui::print_detail("type", &record.kind.to_string());
        ui::print_detail("status", &ui::colored_status(&record.status.to_string()));
        ui::print_detail("platform", &record.platform);
        ui::print_detail(
            "instance",
            &format!("{} ({})", record.instance.name, record.instance.ip),
        );
        for (key, value) in &record.params {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ui::print_detail(key, &ui::masked_param(key, &shown));
        }
        return Ok(());
    }

    if records.is_empty() {
        ui::print_info("No application deployments recorded");
        return Ok(());
    }

    ui::print_section("Application deployments");
    println!(
        "{:<14} {:<16} {:<8} {:<18} {}",
        "ID".bright_black(),
        "NAME".bright_black(),
        "TYPE".bright_black(),
        "STATUS".bright_black(),
        "INSTANCE".bright_black()
    );
    for record in &records {
        println!(
            "{:<14} {:<16} {:<8} {:<18} {}",
            record.id,
            record.name,
            record.kind,
            ui::colored_status(&record.status.to_string()),
            record.instance.ip
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_compose_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("compose.yaml"), "services: {}").unwrap();
        ensure_compose(dir.path(), "Nextcloud").unwrap();
        assert!(!dir.path().join("docker-compose.yml").exists());
    }

    #[test]
    fn test_ensure_compose_stages_packaged_fallback() {
        let dir = tempfile::tempdir().unwrap();
        ensure_compose(dir.path(), "Nextcloud").unwrap();
        let content =
            std::fs::read_to_string(dir.path().join("docker-compose.yml")).unwrap();
        assert!(content.contains("image: nextcloud"));
    }

    #[test]
    fn test_ensure_compose_unknown_app_fails_before_any_run() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_compose(dir.path(), "no-such-app").is_err());
        assert!(!dir.path().join("docker-compose.yml").exists());
    }

    #[test]
    fn test_ensure_playbook_stages_packaged_demo_playbook() {
        let dir = tempfile::tempdir().unwrap();
        let playbook = ensure_playbook(dir.path(), "LAMP").unwrap();
        assert_eq!(playbook, "install.yml");
        let content = std::fs::read_to_string(dir.path().join("install.yml")).unwrap();
        assert!(content.contains("hosts: target"));
    }
}
