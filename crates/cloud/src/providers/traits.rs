//! Provider trait and common connection types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

/// Errors that can occur while connecting to a provider.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The provider's CLI could not be found on PATH.
    #[error("'{cli}' is not installed or not in PATH ({hint})")]
    CliMissing { cli: String, hint: String },

    /// A credential field the provider requires is absent.
    ///
    /// Always carries the full list, collected in one pass.
    #[error("missing credential fields: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    /// Credentials file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Credentials file parse failure.
    #[error("invalid credentials file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// An established provider session.
///
/// Holds the resolved CLI path (when the provider has one) and the
/// environment variables its tooling expects. The session never
/// contains more than what came out of the credential store.
#[derive(Debug)]
pub struct Session {
    pub provider: String,
    pub cli_path: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// One cloud provider's connection contract.
pub trait Provider {
    /// Canonical lowercase provider name.
    fn name(&self) -> &'static str;

    /// Local CLI executable, when the provider has one.
    fn cli(&self) -> Option<&'static str>;

    /// Where to get the CLI when it is missing.
    fn install_hint(&self) -> &'static str;

    /// Credential fields that must be present to connect.
    fn required_fields(&self) -> &'static [&'static str];

    /// Mapping from credential field to environment variable.
    fn env_mapping(&self) -> &'static [(&'static str, &'static str)];

    /// Verify the CLI and credentials, producing a session.
    ///
    /// # Errors
    ///
    /// Returns `CliMissing` when the provider's CLI is not on PATH and
    /// `MissingCredentials` naming every absent required field.
    fn connect(&self, creds: &BTreeMap<String, String>) -> Result<Session, ConnectError> {
        let cli_path = match self.cli() {
            Some(cli) => {
                let path = which::which(cli).map_err(|_| ConnectError::CliMissing {
                    cli: cli.to_string(),
                    hint: self.install_hint().to_string(),
                })?;
                debug!("Found {cli} at {}", path.display());
                Some(path)
            }
            None => None,
        };

        let missing: Vec<String> = self
            .required_fields()
            .iter()
            .filter(|f| !creds.contains_key(**f))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ConnectError::MissingCredentials(missing));
        }

        let env = self
            .env_mapping()
            .iter()
            .filter_map(|(field, var)| {
                creds
                    .get(*field)
                    .map(|value| ((*var).to_string(), value.clone()))
            })
            .collect();

        Ok(Session {
            provider: self.name().to_string(),
            cli_path,
            env,
        })
    }
}
