//! Stratus deployment orchestrator CLI.
//!
//! Wraps Terraform, Ansible and Docker Compose behind a unified set of
//! subcommands, plus a remote API that turns natural language into
//! shell commands.

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod ui;

use commands::app::AppCommand;
use commands::chat::ChatCommand;
use commands::config::ConfigCommand;
use commands::connect::ConnectCommand;
use commands::deploy::DeployCommand;
use commands::diagnose::DiagnoseCommand;
use commands::login::{AccountCommand, LoginCommand, LogoutCommand};
use commands::monitor::MonitorCommand;
use commands::template::TemplateCommand;

/// Stratus - deployment orchestrator.
#[derive(Parser)]
#[command(
    name = "stratus",
    version,
    about = "Deploy infrastructure and applications from templates",
    long_about = "Deploy infrastructure with Terraform, install applications with\n\
                  Ansible or Docker Compose, and chat with the Stratus API to turn\n\
                  natural language into shell commands."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy and manage infrastructure from templates.
    Deploy(DeployCommand),

    /// Install and manage applications on deployed instances.
    App(AppCommand),

    /// Manage template files across configuration tiers.
    Template(TemplateCommand),

    /// Store credentials and connect to a cloud provider.
    Connect(ConnectCommand),

    /// Log in to the Stratus API.
    Login(LoginCommand),

    /// Drop the stored API token.
    Logout(LogoutCommand),

    /// Show the logged-in account.
    Account(AccountCommand),

    /// Turn a natural-language request into a shell command.
    Chat(ChatCommand),

    /// Watch system resource usage.
    Monitor(MonitorCommand),

    /// Summarize system and service health.
    Diagnose(DiagnoseCommand),

    /// Show or change configuration values.
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("info,stratus_core=debug,stratus_cloud=debug,stratus_api=debug")
    } else {
        EnvFilter::new("warn,stratus_core=info,stratus_cloud=info,stratus_api=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = stratus_core::Config::load()?;

    match cli.command {
        Commands::Deploy(cmd) => cmd.run(&config),
        Commands::App(cmd) => cmd.run(&config),
        Commands::Template(cmd) => cmd.run(&config).await,
        Commands::Connect(cmd) => cmd.run(&config),
        Commands::Login(cmd) => cmd.run(&mut config).await,
        Commands::Logout(cmd) => cmd.run(&mut config),
        Commands::Account(cmd) => cmd.run(&config).await,
        Commands::Chat(cmd) => cmd.run(&config).await,
        Commands::Monitor(cmd) => cmd.run(),
        Commands::Diagnose(cmd) => cmd.run(),
        Commands::Config(cmd) => cmd.run(&mut config),
    }
}
