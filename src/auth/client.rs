//! REST backend for login and signup

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("server returned {code}")]
    Status { code: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("login response had no token")]
    MissingToken,
}

impl AuthError {
    /// The server-provided `error` message, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AuthError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub trait AuthBackend: Send + Sync {
    fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError>;
    fn signup(&self, request: &SignupRequest) -> Result<(), AuthError>;
}

/// JSON over HTTP with a blocking `ureq` agent
pub struct HttpAuthBackend {
    agent: ureq::Agent,
    login_url: String,
    signup_url: String,
}

impl HttpAuthBackend {
    pub fn new(config: &AppConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(Duration::from_secs(15)).build();
        Self {
            agent,
            login_url: config.endpoint("login"),
            signup_url: config.endpoint("signup"),
        }
    }

    fn post(&self, url: &str, body: &impl Serialize) -> Result<ureq::Response, AuthError> {
        tracing::debug!(url, "POST");
        self.agent.post(url).send_json(body).map_err(|e| match e {
            ureq::Error::Status(code, response) => {
                let message = error_field(response);
                tracing::warn!(url, code, message = message.as_deref().unwrap_or(""), "auth request rejected");
                AuthError::Status { code, message }
            }
            other => {
                tracing::warn!(url, error = %other, "auth request failed");
                AuthError::Transport(other.to_string())
            }
        })
    }
}

/// `error` string from a JSON error body
fn error_field(response: ureq::Response) -> Option<String> {
    let body: serde_json::Value = response.into_json().ok()?;
    body.get("error").and_then(|v| v.as_str()).map(str::to_owned)
}

impl AuthBackend for HttpAuthBackend {
    fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let response = self.post(&self.login_url, request)?;
        response
            .into_json::<LoginResponse>()
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    fn signup(&self, request: &SignupRequest) -> Result<(), AuthError> {
        self.post(&self.signup_url, request).map(|_| ())
    }
}
