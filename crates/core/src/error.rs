//! Error taxonomy for the deployment core.

use thiserror::Error;

use crate::driver::Phase;

/// Errors that can occur in the deployment core.
#[derive(Error, Debug)]
pub enum Error {
    /// A template or application could not be resolved.
    #[error("template '{name}' not found{}", category_suffix(.category))]
    TemplateNotFound {
        name: String,
        category: Option<String>,
    },

    /// Required parameters were absent and had no declared default.
    ///
    /// Always carries the full list, collected in one pass.
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    /// The external tool executable could not be found.
    #[error("'{tool}' is not installed or not in PATH ({hint})")]
    ToolMissing { tool: String, hint: String },

    /// The external tool exited non-zero during a phase.
    #[error("{phase} failed: {stderr}")]
    Tool { phase: Phase, stderr: String },

    /// A driver was asked to run a phase it does not implement.
    #[error("{driver} driver does not support the {phase} phase")]
    UnsupportedPhase { driver: String, phase: Phase },

    /// A deployment id did not map to a working directory on disk.
    #[error("deployment '{0}' not found")]
    DeploymentNotFound(String),

    /// The operator declined the plan confirmation.
    #[error("deployment cancelled by operator")]
    Cancelled,

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML manifest parse error.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),
}

fn category_suffix(category: &Option<String>) -> String {
    match category {
        Some(c) => format!(" in category '{c}'"),
        None => String::new(),
    }
}
