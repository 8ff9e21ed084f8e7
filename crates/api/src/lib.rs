//! Typed client for the Stratus remote command API.
//!
//! The API turns natural-language requests into shell commands with an
//! explanation. Authentication is a bearer token obtained from
//! `POST /api/auth/login` and persisted by the CLI in its config.

mod client;
pub mod models;

pub use client::{ApiClient, ApiError};
pub use models::{AccountInfo, CommandResponse, ExecutionMode, TokenUsage};
