//! Provider abstractions.

pub mod aws;
pub mod azure;
pub mod gcp;
pub mod nutanix;
pub mod openstack;
pub mod proxmox;
mod traits;
pub mod vmware;

pub use traits::{ConnectError, Provider, Session};

pub use aws::Aws;
pub use azure::Azure;
pub use gcp::Gcp;
pub use nutanix::Nutanix;
pub use openstack::OpenStack;
pub use proxmox::Proxmox;
pub use vmware::Vmware;

/// Canonical provider names, in display order.
pub const PROVIDER_NAMES: [&str; 7] = [
    "aws",
    "gcp",
    "azure",
    "openstack",
    "proxmox",
    "vmware",
    "nutanix",
];

/// Look up a provider by its canonical name.
#[must_use]
pub fn provider_for(name: &str) -> Option<Box<dyn Provider>> {
    match name.to_lowercase().as_str() {
        "aws" => Some(Box::new(Aws)),
        "gcp" => Some(Box::new(Gcp)),
        "azure" => Some(Box::new(Azure)),
        "openstack" => Some(Box::new(OpenStack)),
        "proxmox" => Some(Box::new(Proxmox)),
        "vmware" => Some(Box::new(Vmware)),
        "nutanix" => Some(Box::new(Nutanix)),
        _ => None,
    }
}
