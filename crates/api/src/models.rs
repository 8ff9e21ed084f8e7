//! Request and response types for the remote command API.

use serde::{Deserialize, Serialize};

/// How a generated command should be handled server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Generate and explain only, never run.
    DryRun,
    /// Generate, explain, and run after local confirmation.
    Supervised,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandRequest<'a> {
    pub user_input: &'a str,
    pub execution_mode: ExecutionMode,
}

/// Token accounting attached to each command response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// A generated command with its explanation.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandResponse {
    /// The shell command the API generated.
    pub action: String,
    /// Human-readable explanation of what the command does.
    pub explanation: String,
    /// Captured output, present only when the server executed the
    /// command.
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

/// Account details returned by `GET /api/account`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub email: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub tokens_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_mode_wire_form() {
        assert_eq!(
            serde_json::to_string(&ExecutionMode::DryRun).unwrap(),
            "\"dry_run\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionMode::Supervised).unwrap(),
            "\"supervised\""
        );
    }

    #[test]
    fn test_command_response_tolerates_missing_fields() {
        let json = r#"{"action": "ls", "explanation": "lists files"}"#;
        let response: CommandResponse = serde_json::from_str(json).unwrap();
        assert!(response.output.is_none());
        assert_eq!(response.token_usage.total_tokens, 0);
    }
}
