use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing::debug;

use stratus_core::driver::{self, TerraformDriver};
use stratus_core::record::DeploymentRecord;
use stratus_core::{manifest, store, Config, Error};

use crate::ui;

/// Deploy and manage infrastructure
#[derive(Args)]
pub struct DeployCommand {
    #[command(subcommand)]
    action: DeployAction,
}

#[derive(Subcommand)]
enum DeployAction {
    /// List available templates, grouped by provider
    List,

    /// Deploy infrastructure from a template
    Run {
        /// Template path, e.g. aws/vpc
        template: String,

        /// Template parameter, repeatable (key=value)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Apply without asking for plan confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List recorded deployments
    Deployments,

    /// Destroy a deployment's infrastructure
    Destroy {
        /// Deployment id
        id: String,

        /// Destroy without confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

impl DeployCommand {
    pub fn run(&self, config: &Config) -> Result<()> {
        match &self.action {
            DeployAction::List => list_templates(config),
            DeployAction::Run {
                template,
                params,
                yes,
            } => deploy(config, template, params, *yes),
            DeployAction::Deployments => list_deployments(config),
            DeployAction::Destroy { id, yes } => destroy(config, id, *yes),
        }
    }
}

fn list_templates(config: &Config) -> Result<()> {
    let templates = manifest::available_templates(config);
    if templates.is_empty() {
        ui::print_warning("No templates found");
        ui::print_info(&format!(
            "Add template directories under {}",
            config.terraform_templates_dir().display()
        ));
        return Ok(());
    }

    ui::print_section("Available templates");
    let mut current_provider = "";
    for template in &templates {
        if template.provider != current_provider {
            println!("{}", template.provider.cyan().bold());
            current_provider = &template.provider;
        }
        println!(
            "  {:<24} {}",
            template.path.bold(),
            template.description.bright_black()
        );
    }
    Ok(())
}

fn deploy(config: &Config, template: &str, params: &[String], yes: bool) -> Result<()> {
    let params = super::parse_params(params)?;

    debug!("Staging {template} under {}", config.deployments_dir.display());
    ui::print_section(&format!("Deploying {template}"));
    ui::print_step("Staging working directory");
    let prepared = stratus_core::materializer::prepare(config, template, &params)
        .context("failed to stage the deployment")?;
    ui::print_detail("id", &prepared.record.id);

    let driver = TerraformDriver::new(config);
    let result = driver::deploy(&prepared.dir, &driver, |plan| {
        println!("\n{plan}");
        if yes {
            return true;
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Apply this plan?")
            .default(false)
            .interact()
            .unwrap_or(false)
    });

    match result {
        Ok(record) => {
            ui::print_success(&format!("Deployed {} ({})", record.template, record.id));
            if let Some(outputs) = &record.outputs {
                for (name, value) in outputs {
                    ui::print_detail(name, &value.to_string());
                }
            }
            Ok(())
        }
        Err(Error::Cancelled) => {
            println!("{}", "Deployment cancelled.".yellow());
            Ok(())
        }
        Err(e) => {
            ui::print_error("Deployment failed");
            Err(e.into())
        }
    }
}

fn list_deployments(config: &Config) -> Result<()> {
    let records: Vec<DeploymentRecord> = store::list(&config.deployments_dir);
    if records.is_empty() {
        ui::print_info("No deployments recorded");
        return Ok(());
    }

    ui::print_section("Deployments");
    println!(
        "{:<38} {:<20} {:<14} {}",
        "ID".bright_black(),
        "TEMPLATE".bright_black(),
        "STATUS".bright_black(),
        "CREATED".bright_black()
    );
    for record in &records {
        println!(
            "{:<38} {:<20} {:<14} {}",
            record.id,
            record.template,
            ui::colored_status(&record.status.to_string()),
            record.created_at
        );
    }
    Ok(())
}

fn destroy(config: &Config, id: &str, yes: bool) -> Result<()> {
    debug!("Destroying deployment {id}");
    let dir = store::deployment_dir(&config.deployments_dir, id)
        .ok_or_else(|| Error::DeploymentNotFound(id.to_string()))?;
    let record: DeploymentRecord = store::read(&dir)?
        .ok_or_else(|| Error::DeploymentNotFound(id.to_string()))?;

    if !yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Destroy {} ({})?", record.template, record.id))
            .default(false)
            .interact()?;
        if !proceed {
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
    }

    let driver = TerraformDriver::new(config);
    let pb = ui::spinner("Destroying infrastructure");
    match driver::destroy(&dir, &driver) {
        Ok(_) => {
            ui::finish_spinner(&pb, "done");
            ui::print_success(&format!("Destroyed {id}"));
            Ok(())
        }
        Err(e) => {
            ui::finish_spinner(&pb, "failed");
            ui::print_error("Destroy failed");
            Err(e.into())
        }
    }
}
