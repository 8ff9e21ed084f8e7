use std::process::Command;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use stratus_api::{ApiClient, ApiError, ExecutionMode};
use stratus_core::Config;

use crate::ui;

/// Turn a natural-language request into a shell command
#[derive(Args)]
pub struct ChatCommand {
    /// The request (prompted when omitted)
    prompt: Vec<String>,

    /// Run the generated command after confirmation
    #[arg(long)]
    execute: bool,
}

impl ChatCommand {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let Some(token) = config.api.token.clone() else {
            bail!("not logged in, run 'stratus login' first");
        };

        let user_input = if self.prompt.is_empty() {
            Input::with_theme(&ColorfulTheme::default())
                .with_prompt("What do you want to do?")
                .interact_text()?
        } else {
            self.prompt.join(" ")
        };

        let mode = if self.execute {
            ExecutionMode::Supervised
        } else {
            ExecutionMode::DryRun
        };

        let client = ApiClient::new(config.api.url.clone(), Some(token));
        let pb = ui::spinner("Thinking");
        let response = match client.command(&user_input, mode).await {
            Ok(response) => {
                ui::finish_spinner(&pb, "done");
                response
            }
            Err(e @ ApiError::Unauthorized) => {
                ui::finish_spinner(&pb, "failed");
                ui::print_warning("Your session has expired");
                return Err(e.into());
            }
            Err(e) => {
                ui::finish_spinner(&pb, "failed");
                return Err(e.into());
            }
        };

        println!();
        println!("  {}", response.action.bold());
        println!("  {}", response.explanation.bright_black());
        if response.token_usage.total_tokens > 0 {
            println!(
                "  {}",
                format!("{} tokens", response.token_usage.total_tokens).bright_black()
            );
        }

        if let Some(output) = &response.output {
            println!("\n{output}");
            return Ok(());
        }

        if self.execute {
            let proceed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Run this command?")
                .default(false)
                .interact()?;
            if !proceed {
                println!("{}", "Skipped.".yellow());
                return Ok(());
            }
            let status = Command::new("sh").arg("-c").arg(&response.action).status()?;
            if !status.success() {
                bail!("command exited with {status}");
            }
        }
        Ok(())
    }
}
