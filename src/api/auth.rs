//! Authentication endpoints

use async_trait::async_trait;
use reqwest::Method;

use super::{error_from_body, ApiClient, AuthApi};
use crate::{
    error::{AppError, AppResult},
    models::{LoginRequest, LoginResponse, RegisterRequest},
};

#[async_trait]
impl AuthApi for ApiClient {
    /// The body must be JSON even on failure; anything else is reported as an
    /// invalid response before the status is looked at.
    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        tracing::info!("Attempting login for {}", request.email);

        let response = self
            .request(Method::POST, "/auth/login")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!("Login response status: {}", status);

        if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
            return Err(AppError::UnexpectedResponse(
                "Invalid response format from server".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Any 2xx is a success; the body is returned as JSON when it is JSON, as a
    /// string otherwise.
    async fn register(&self, request: &RegisterRequest) -> AppResult<serde_json::Value> {
        tracing::info!("Registering account for {}", request.email);

        let response = self
            .request(Method::POST, "/auth/regist")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        Ok(serde_json::from_slice(&body).unwrap_or_else(|_| {
            tracing::debug!("Registration answered {} with a non-JSON body", status);
            serde_json::Value::String(String::from_utf8_lossy(&body).into_owned())
        }))
    }
}
