//! Authentication
//!
//! Login and signup forms posting to the REST backend. Requests run on a
//! background task; `poll` applies the outcome and reports where to navigate.

mod client;
mod form;
pub mod screen;

use std::sync::Arc;

pub use client::{AuthBackend, AuthError, HttpAuthBackend, LoginRequest, LoginResponse, SignupRequest};
pub use form::{Field, FieldError, LoginField, LoginForm, SignupField, SignupForm};

use crate::app::Route;
use crate::storage::{SharedStore, TOKEN_KEY};
use crate::task::{AsyncOp, TaskError};

pub const MSG_LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
pub const MSG_SIGNUP_FAILED: &str = "Signup failed. Please try again.";
pub const MSG_SIGNUP_OK: &str = "Signup successful! Please log in.";

enum Pending {
    Login {
        username: String,
        op: AsyncOp<Result<LoginResponse, AuthError>>,
    },
    Signup(AsyncOp<Result<(), AuthError>>),
}

pub struct AuthController {
    backend: Arc<dyn AuthBackend>,
    store: SharedStore,
    pending: Option<Pending>,
    pub login: LoginForm,
    pub signup: SignupForm,
    pub login_error: Option<String>,
    pub signup_error: Option<String>,
    /// Shown on the login screen after a successful signup
    pub notice: Option<String>,
    username: Option<String>,
}

impl AuthController {
    pub fn new(backend: Arc<dyn AuthBackend>, store: SharedStore) -> Self {
        Self {
            backend,
            store,
            pending: None,
            login: LoginForm::default(),
            signup: SignupForm::default(),
            login_error: None,
            signup_error: None,
            notice: None,
            username: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Signed-in username
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Validate and post the login form. Returns true if a request was sent.
    pub fn submit_login(&mut self) -> bool {
        self.login.submitted = true;
        if !self.login.is_valid() || self.pending.is_some() {
            return false;
        }
        let request = self.login.request();
        let username = request.username.clone();
        let backend = Arc::clone(&self.backend);
        self.login_error = None;
        tracing::debug!(%username, "submitting login");
        self.pending = Some(Pending::Login {
            username,
            op: AsyncOp::spawn(move || backend.login(&request)),
        });
        true
    }

    /// Validate and post the signup form. Returns true if a request was sent.
    pub fn submit_signup(&mut self) -> bool {
        self.signup.submitted = true;
        if !self.signup.is_valid() || self.pending.is_some() {
            return false;
        }
        let request = self.signup.request();
        let backend = Arc::clone(&self.backend);
        self.signup_error = None;
        tracing::debug!(username = %request.username, "submitting signup");
        self.pending = Some(Pending::Signup(AsyncOp::spawn(move || backend.signup(&request))));
        true
    }

    /// Apply a finished request. Returns the route to navigate to, if any.
    pub fn poll(&mut self) -> Option<Route> {
        let pending = self.pending.as_mut()?;
        match pending {
            Pending::Login { op, .. } => {
                let result = op.poll()?;
                let Some(Pending::Login { username, .. }) = self.pending.take() else {
                    return None;
                };
                self.finish_login(username, result)
            }
            Pending::Signup(op) => {
                let result = op.poll()?;
                self.pending = None;
                self.finish_signup(result)
            }
        }
    }

    fn finish_login(&mut self, username: String, result: Result<Result<LoginResponse, AuthError>, TaskError>) -> Option<Route> {
        let token = match result {
            Ok(Ok(LoginResponse { token: Some(token) })) if !token.is_empty() => token,
            Ok(Ok(_)) => {
                tracing::warn!(error = %AuthError::MissingToken, "login failed");
                self.login_error = Some(MSG_LOGIN_FAILED.to_string());
                return None;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "login failed");
                self.login_error = Some(MSG_LOGIN_FAILED.to_string());
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, "login task failed");
                self.login_error = Some(MSG_LOGIN_FAILED.to_string());
                return None;
            }
        };

        self.store.borrow_mut().set_item(TOKEN_KEY, token);
        tracing::info!(%username, "logged in");
        self.username = Some(username);
        self.login = LoginForm::default();
        self.login_error = None;
        self.notice = None;
        Some(Route::Dashboard)
    }

    fn finish_signup(&mut self, result: Result<Result<(), AuthError>, TaskError>) -> Option<Route> {
        match result {
            Ok(Ok(())) => {
                tracing::info!(username = %self.signup.username.value, "signed up");
                self.signup = SignupForm::default();
                self.signup_error = None;
                self.notice = Some(MSG_SIGNUP_OK.to_string());
                Some(Route::Login)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "signup failed");
                let message = e.server_message().unwrap_or(MSG_SIGNUP_FAILED);
                self.signup_error = Some(message.to_string());
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "signup task failed");
                self.signup_error = Some(MSG_SIGNUP_FAILED.to_string());
                None
            }
        }
    }

    /// Drop the session token and return to login
    pub fn logout(&mut self) -> Route {
        self.store.borrow_mut().remove_item(TOKEN_KEY);
        self.username = None;
        tracing::info!("Logged out");
        Route::Login
    }
}
