//! HTTP client for the remote command API.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    AccountInfo, CommandRequest, CommandResponse, ExecutionMode, LoginRequest, LoginResponse,
    RegisterRequest,
};

/// Errors from talking to the remote API.
///
/// Connection and timeout failures surface as `Http`; responses the
/// server answered with a non-success status surface as `Status`, with
/// 401 split out so callers can suggest a re-login.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The server rejected the bearer token.
    #[error("authentication required, run 'stratus login'")]
    Unauthorized,
}

/// Client for one API endpoint, carrying the bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    /// Whether a token is loaded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Exchange credentials for a bearer token. The token is retained
    /// for subsequent calls and returned for persistence.
    ///
    /// # Errors
    ///
    /// `Unauthorized` on bad credentials, `Status`/`Http` otherwise.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, ApiError> {
        let response: LoginResponse = self
            .post("/api/auth/login", &LoginRequest { email, password })
            .await?;
        self.token = Some(response.token.clone());
        Ok(response.token)
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// `Status`/`Http` on failure of either step.
    pub async fn register(&mut self, email: &str, password: &str) -> Result<String, ApiError> {
        let _: serde_json::Value = self
            .post("/api/auth/register", &RegisterRequest { email, password })
            .await?;
        self.login(email, password).await
    }

    /// Ask the API to turn `user_input` into a command.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when the token is missing or rejected.
    pub async fn command(
        &self,
        user_input: &str,
        execution_mode: ExecutionMode,
    ) -> Result<CommandResponse, ApiError> {
        self.post(
            "/api/command",
            &CommandRequest {
                user_input,
                execution_mode,
            },
        )
        .await
    }

    /// Fetch the authenticated account's details.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when the token is missing or rejected.
    pub async fn account(&self) -> Result<AccountInfo, ApiError> {
        let request = self.client.get(format!("{}/api/account", self.base_url));
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => return Err(ApiError::Unauthorized),
        };
        Self::handle(request.send().await?).await
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        debug!("POST {path}");
        let mut request = self.client.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Self::handle(request.send().await?).await
    }

    async fn handle<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prefer the server's structured message when there is one.
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
