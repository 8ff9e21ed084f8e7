//! Core deployment engine for the Stratus CLI.
//!
//! This crate owns everything between "the user named a template" and
//! "an external tool ran against a staged working directory": template
//! resolution, deployment materialization, the external tool drivers
//! with their lifecycle state machines, and the per-deployment JSON
//! metadata records that survive between CLI invocations.

pub mod config;
pub mod demo;
pub mod driver;
pub mod error;
pub mod instances;
pub mod inventory;
pub mod manifest;
pub mod materializer;
pub mod record;
pub mod resolver;
pub mod store;

pub use config::Config;
pub use error::Error;

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
