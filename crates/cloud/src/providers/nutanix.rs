//! Nutanix Prism Central. API-only, no local CLI.

use super::Provider;

pub struct Nutanix;

impl Provider for Nutanix {
    fn name(&self) -> &'static str {
        "nutanix"
    }

    fn cli(&self) -> Option<&'static str> {
        None
    }

    fn install_hint(&self) -> &'static str {
        "no local CLI required"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["endpoint", "username", "password"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("endpoint", "NUTANIX_ENDPOINT"),
            ("username", "NUTANIX_USERNAME"),
            ("password", "NUTANIX_PASSWORD"),
        ]
    }
}
