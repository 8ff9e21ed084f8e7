//! VMware vSphere via govc.

use super::Provider;

pub struct Vmware;

impl Provider for Vmware {
    fn name(&self) -> &'static str {
        "vmware"
    }

    fn cli(&self) -> Option<&'static str> {
        Some("govc")
    }

    fn install_hint(&self) -> &'static str {
        "see https://github.com/vmware/govmomi/tree/main/govc"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["url", "username", "password"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("url", "GOVC_URL"),
            ("username", "GOVC_USERNAME"),
            ("password", "GOVC_PASSWORD"),
            ("insecure", "GOVC_INSECURE"),
        ]
    }
}
