//! Proxmox VE. API-only, no local CLI.

use super::Provider;

pub struct Proxmox;

impl Provider for Proxmox {
    fn name(&self) -> &'static str {
        "proxmox"
    }

    fn cli(&self) -> Option<&'static str> {
        None
    }

    fn install_hint(&self) -> &'static str {
        "no local CLI required"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["api_url", "token_id", "token_secret"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("api_url", "PM_API_URL"),
            ("token_id", "PM_API_TOKEN_ID"),
            ("token_secret", "PM_API_TOKEN_SECRET"),
        ]
    }
}
