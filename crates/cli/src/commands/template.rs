use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::debug;

use stratus_core::resolver::TemplateResolver;
use stratus_core::Config;

use crate::ui;

/// Manage template files
#[derive(Args)]
pub struct TemplateCommand {
    #[command(subcommand)]
    action: TemplateAction,
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List templates per source tier
    List {
        /// Restrict to one category, e.g. terraform or apps
        #[arg(long)]
        category: Option<String>,
    },

    /// Show where a template resolves from, with a preview
    Show {
        /// Template name
        name: String,

        #[arg(long)]
        category: Option<String>,
    },

    /// Download a template into the user data tier
    Install {
        /// Template name to install as
        name: String,

        /// URL to fetch the template content from
        #[arg(long)]
        url: String,

        #[arg(long)]
        category: Option<String>,
    },

    /// Remove a template from the user tiers
    Remove {
        /// Template name
        name: String,

        #[arg(long)]
        category: Option<String>,
    },
}

impl TemplateCommand {
    pub async fn run(&self, _config: &Config) -> Result<()> {
        let resolver = TemplateResolver::from_env();
        match &self.action {
            TemplateAction::List { category } => list(&resolver, category.as_deref()),
            TemplateAction::Show { name, category } => show(&resolver, name, category.as_deref()),
            TemplateAction::Install {
                name,
                url,
                category,
            } => install(&resolver, name, url, category.as_deref()).await,
            TemplateAction::Remove { name, category } => {
                remove(&resolver, name, category.as_deref())
            }
        }
    }
}

fn list(resolver: &TemplateResolver, category: Option<&str>) -> Result<()> {
    let listing = resolver.list(category);
    let mut any = false;
    for (tier, names) in &listing {
        if names.is_empty() {
            continue;
        }
        any = true;
        println!("{}", tier.to_string().cyan().bold());
        for name in names {
            println!("  {name}");
        }
    }
    if !any {
        ui::print_info("No templates found");
    }
    Ok(())
}

fn show(resolver: &TemplateResolver, name: &str, category: Option<&str>) -> Result<()> {
    let resolved = resolver.resolve(name, category)?;

    ui::print_section(name);
    ui::print_detail("source", &resolved.source.to_string());
    if let Some(path) = &resolved.path {
        ui::print_detail("path", &path.display().to_string());
    }
    println!();
    // First 20 lines are plenty for a preview.
    for line in resolved.content.lines().take(20) {
        println!("  {line}");
    }
    let total = resolved.content.lines().count();
    if total > 20 {
        println!("  {}", format!("... {} more lines", total - 20).bright_black());
    }
    Ok(())
}

async fn install(
    resolver: &TemplateResolver,
    name: &str,
    url: &str,
    category: Option<&str>,
) -> Result<()> {
    debug!("Fetching template {name} from {url}");
    let pb = ui::spinner(&format!("Fetching {url}"));
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
    if !response.status().is_success() {
        ui::finish_spinner(&pb, "failed");
        bail!("fetching {url} returned {}", response.status());
    }
    let content = response.text().await?;
    ui::finish_spinner(&pb, "done");

    let path = resolver.install(name, category, &content)?;
    ui::print_success(&format!("Installed {name} at {}", path.display()));
    Ok(())
}

fn remove(resolver: &TemplateResolver, name: &str, category: Option<&str>) -> Result<()> {
    if resolver.remove(name, category)? {
        ui::print_success(&format!("Removed {name}"));
    } else {
        ui::print_warning(&format!(
            "'{name}' was not found in the user tiers (system and packaged templates cannot be removed)"
        ));
    }
    Ok(())
}
