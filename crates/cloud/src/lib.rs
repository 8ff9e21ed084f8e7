//! Cloud provider connection glue for Stratus.
//!
//! Supported providers:
//!
//! - **AWS**, **GCP**, **Azure** via their official CLIs
//! - **OpenStack** via the openstack client
//! - **VMware** via govc
//! - **Proxmox**, **Nutanix** via their HTTP APIs (no local CLI)
//!
//! Connecting verifies the provider's CLI is installed (when one
//! exists), checks the stored credentials carry every required field,
//! and yields a [`Session`] holding the environment the provider's
//! tooling expects. Credentials persist per provider in
//! `credentials.yaml` under the Stratus base directory.

pub mod credentials;
pub mod providers;

pub use credentials::CredentialStore;
pub use providers::{provider_for, ConnectError, Provider, Session, PROVIDER_NAMES};
