use std::collections::BTreeMap;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Password};

use stratus_cloud::{provider_for, CredentialStore, Provider, PROVIDER_NAMES};
use stratus_core::Config;

use crate::ui;

/// Store credentials and connect to a cloud provider
#[derive(Args)]
pub struct ConnectCommand {
    /// Provider name (aws, gcp, azure, openstack, proxmox, vmware, nutanix)
    provider: Option<String>,

    /// Credential field, repeatable (key=value)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

impl ConnectCommand {
    pub fn run(&self, _config: &Config) -> Result<()> {
        let path = stratus_core::Config::base_dir().join("credentials.yaml");
        let mut store = CredentialStore::open(&path)?;

        let Some(name) = &self.provider else {
            return list_connections(&store);
        };

        let Some(provider) = provider_for(name) else {
            bail!(
                "unknown provider '{name}' (supported: {})",
                PROVIDER_NAMES.join(", ")
            );
        };

        let mut fields = store.get(provider.name());
        for pair in &self.set {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("invalid credential '{pair}', expected key=value");
            };
            fields.insert(key.to_string(), value.to_string());
        }
        prompt_missing(provider.as_ref(), &mut fields)?;

        store.set(provider.name(), fields.clone());
        store.save()?;

        let session = provider.connect(&fields)?;
        ui::print_success(&format!("Connected to {}", session.provider));
        if let Some(cli_path) = &session.cli_path {
            ui::print_detail("cli", &cli_path.display().to_string());
        }
        for (var, _) in &session.env {
            ui::print_detail("env", var);
        }
        Ok(())
    }
}

fn list_connections(store: &CredentialStore) -> Result<()> {
    let stored = store.providers();
    ui::print_section("Providers");
    for name in PROVIDER_NAMES {
        let marker = if stored.contains(&name) {
            "configured".green().to_string()
        } else {
            "not configured".bright_black().to_string()
        };
        println!("  {name:<12} {marker}");
    }
    Ok(())
}

/// Ask for any required field the store and --set flags did not cover.
fn prompt_missing(
    provider: &dyn Provider,
    fields: &mut BTreeMap<String, String>,
) -> Result<()> {
    for field in provider.required_fields() {
        if fields.contains_key(*field) {
            continue;
        }
        let lowered = field.to_lowercase();
        let value = if ["password", "secret", "token"]
            .iter()
            .any(|s| lowered.contains(s))
        {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(*field)
                .interact()?
        } else {
            Input::with_theme(&ColorfulTheme::default())
                .with_prompt(*field)
                .interact_text()?
        };
        fields.insert((*field).to_string(), value);
    }
    Ok(())
}
