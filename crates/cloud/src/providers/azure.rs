//! Microsoft Azure.

use super::Provider;

pub struct Azure;

impl Provider for Azure {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn cli(&self) -> Option<&'static str> {
        Some("az")
    }

    fn install_hint(&self) -> &'static str {
        "see https://learn.microsoft.com/cli/azure/install-azure-cli"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["subscription_id"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("subscription_id", "AZURE_SUBSCRIPTION_ID"),
            ("tenant_id", "AZURE_TENANT_ID"),
            ("client_id", "AZURE_CLIENT_ID"),
            ("client_secret", "AZURE_CLIENT_SECRET"),
        ]
    }
}
