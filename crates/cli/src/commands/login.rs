use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input, Password};

use stratus_api::ApiClient;
use stratus_core::Config;

use crate::ui;

/// Log in to the Stratus API
#[derive(Args)]
pub struct LoginCommand {
    /// Account email (prompted when omitted)
    email: Option<String>,

    /// Create the account first
    #[arg(long)]
    register: bool,
}

impl LoginCommand {
    pub async fn run(&self, config: &mut Config) -> Result<()> {
        let email = match &self.email {
            Some(email) => email.clone(),
            None => Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Email")
                .interact_text()?,
        };
        let password = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?;

        let mut client = ApiClient::new(config.api.url.clone(), None);
        let token = if self.register {
            client.register(&email, &password).await?
        } else {
            client.login(&email, &password).await?
        };

        config.api.token = Some(token);
        config.save().context("failed to persist the API token")?;
        ui::print_success(&format!("Logged in as {email}"));
        Ok(())
    }
}

/// Show the logged-in account
#[derive(Args)]
pub struct AccountCommand {}

impl AccountCommand {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let Some(token) = config.api.token.clone() else {
            ui::print_info("Not logged in");
            return Ok(());
        };

        let client = ApiClient::new(config.api.url.clone(), Some(token));
        let account = client.account().await?;
        ui::print_detail("email", &account.email);
        if let Some(plan) = &account.plan {
            ui::print_detail("plan", plan);
        }
        ui::print_detail("tokens used", &account.tokens_used.to_string());
        Ok(())
    }
}

/// Drop the stored API token
#[derive(Args)]
pub struct LogoutCommand {}

impl LogoutCommand {
    pub fn run(&self, config: &mut Config) -> Result<()> {
        if config.api.token.take().is_none() {
            ui::print_info("Not logged in");
            return Ok(());
        }
        config.save()?;
        ui::print_success("Logged out");
        Ok(())
    }
}
