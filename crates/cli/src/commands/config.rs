use anyhow::Result;
use clap::{Args, Subcommand};

use stratus_core::Config;

use crate::ui;

/// Show or change configuration values
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,

    /// Set one configuration key
    Set {
        /// Key, e.g. terraform_path or api.url
        key: String,
        value: String,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &mut Config) -> Result<()> {
        match &self.action {
            ConfigAction::Show => show(config),
            ConfigAction::Set { key, value } => {
                config.set_key(key, value)?;
                config.save()?;
                ui::print_success(&format!("Set {key}"));
                Ok(())
            }
        }
    }
}

fn show(config: &Config) -> Result<()> {
    let mut rendered = serde_json::to_value(config)?;
    // Never echo the token back.
    if let Some(token) = rendered.pointer_mut("/api/token") {
        *token = serde_json::Value::String("********".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    ui::print_detail("file", &Config::config_file().display().to_string());
    Ok(())
}
