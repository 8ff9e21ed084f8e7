//! CLI subcommand implementations.

pub mod app;
pub mod chat;
pub mod config;
pub mod connect;
pub mod deploy;
pub mod diagnose;
pub mod login;
pub mod monitor;
pub mod template;

use anyhow::{bail, Result};
use serde_json::{Map, Value};

/// Parse repeated `-p key=value` arguments into a parameter map.
///
/// Values parse as JSON scalars first so `count=3` and `public=true`
/// keep their types; anything unparseable stays a string.
pub fn parse_params(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut params = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid parameter '{pair}', expected key=value");
        };
        let parsed = serde_json::from_str(value).unwrap_or(Value::String(value.to_string()));
        params.insert(key.to_string(), parsed);
    }
    Ok(params)
}
