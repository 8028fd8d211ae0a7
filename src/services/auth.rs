//! Login and registration against the remote API

use std::sync::{atomic::AtomicBool, Arc, Mutex};

use super::{lock, InFlight};
use crate::{
    api::AuthApi,
    error::{AppError, AppResult},
    models::{LoginRequest, RegisterForm},
    nav::Route,
    session::SharedSession,
};

const LOGIN_CONNECT_ERROR: &str = "Cannot connect to the server. Please check if the server is running.";
const LOGIN_FALLBACK: &str = "Login failed: Server returned an error";
const REGISTER_CONNECT_ERROR: &str = "Unable to connect to the server. Please try again later.";
const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Success; go there next
    Redirect(Route),
    /// Failure, with the message shown above the form
    Rejected(String),
    /// A request is already running
    Busy,
}

pub struct AuthGateway {
    api: Arc<dyn AuthApi>,
    session: SharedSession,
    loading: AtomicBool,
    error: Mutex<Option<String>>,
}

impl AuthGateway {
    pub fn new(api: Arc<dyn AuthApi>, session: SharedSession) -> Self {
        Self {
            api,
            session,
            loading: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Message from the last failed attempt
    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn login_label(&self) -> &'static str {
        if self.is_loading() {
            "Signing in..."
        } else {
            "Sign in"
        }
    }

    pub fn register_label(&self) -> &'static str {
        if self.is_loading() {
            "Creating account..."
        } else {
            "Create account"
        }
    }

    /// Exchange credentials for a token and keep it in the session
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let Some(_guard) = InFlight::acquire(&self.loading) else {
            return AuthOutcome::Busy;
        };
        *lock(&self.error) = None;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.try_login(&request).await {
            Ok(route) => AuthOutcome::Redirect(route),
            Err(e) => {
                tracing::error!("Login error: {}", e);
                self.reject(login_message(&e))
            }
        }
    }

    async fn try_login(&self, request: &LoginRequest) -> AppResult<Route> {
        let response = self.api.login(request).await?;
        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Authentication("Authentication failed: No token received".to_string()))?;

        self.session.sign_in(token, response.user)?;
        tracing::info!("Logged in as {}", request.email);
        Ok(Route::Books)
    }

    /// Create an account; passwords are compared before anything is sent
    pub async fn register(&self, name: &str, email: &str, password: &str, confirm_password: &str) -> AuthOutcome {
        let form = RegisterForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        };
        self.register_form(&form).await
    }

    pub async fn register_form(&self, form: &RegisterForm) -> AuthOutcome {
        *lock(&self.error) = None;
        if let Err(message) = form.check() {
            return self.reject(message);
        }

        let Some(_guard) = InFlight::acquire(&self.loading) else {
            return AuthOutcome::Busy;
        };

        match self.api.register(&form.to_request()).await {
            Ok(_) => {
                tracing::info!("Registration successful for {}", form.email);
                AuthOutcome::Redirect(Route::Login)
            }
            Err(e) => {
                tracing::error!("Registration error: {}", e);
                self.reject(register_message(&e))
            }
        }
    }

    /// End the session and go back to the login page
    pub fn logout(&self) -> AppResult<Route> {
        self.session.end()?;
        Ok(Route::Login)
    }

    fn reject(&self, message: String) -> AuthOutcome {
        *lock(&self.error) = Some(message.clone());
        AuthOutcome::Rejected(message)
    }
}

fn login_message(e: &AppError) -> String {
    if let Some(message) = e.server_message() {
        return message.to_string();
    }
    match e {
        AppError::Network(_) => LOGIN_CONNECT_ERROR.to_string(),
        AppError::Api { .. } => LOGIN_FALLBACK.to_string(),
        other => other.user_message(),
    }
}

fn register_message(e: &AppError) -> String {
    if let Some(message) = e.server_message() {
        return message.to_string();
    }
    match e {
        AppError::Network(_) => REGISTER_CONNECT_ERROR.to_string(),
        _ => REGISTER_FALLBACK.to_string(),
    }
}
