//! REST client for the book catalog API
//!
//! `BookApi` and `AuthApi` are the seams the view models talk to; `ApiClient`
//! implements both over `reqwest`.

pub mod auth;
pub mod books;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    config::ApiConfig,
    error::{AppError, AppResult, ErrorResponse},
    models::{Book, BookFormData, BookId, BookPatch, DeleteAck, LoginRequest, LoginResponse, RegisterRequest, SearchRequest},
    session::SharedSession,
};

/// Book endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookApi: Send + Sync {
    /// GET /books
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    /// GET /books/{id}
    async fn get_book(&self, id: BookId) -> AppResult<Book>;
    /// POST /books
    async fn create_book(&self, data: &BookFormData) -> AppResult<Book>;
    /// PATCH /books/{id}
    async fn update_book(&self, id: BookId, patch: &BookPatch) -> AppResult<Book>;
    /// DELETE /books/{id}
    async fn delete_book(&self, id: BookId) -> AppResult<DeleteAck>;
    /// POST /books/search/books
    async fn search_books(&self, request: &SearchRequest) -> AppResult<Vec<Book>>;
}

/// Authentication endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// POST /auth/login
    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse>;
    /// POST /auth/regist
    async fn register(&self, request: &RegisterRequest) -> AppResult<serde_json::Value>;
}

/// HTTP client bound to one API base URL
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<SharedSession>,
}

impl ApiClient {
    /// Create a client from configuration. The session, when given, provides the
    /// bearer token for every request.
    pub fn new(config: &ApiConfig, session: Option<SharedSession>) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, path);
        let builder = self.http.request(method, self.url(path));
        match self.session.as_ref().and_then(|s| s.token()) {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Send a request and decode a 2xx JSON body
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = builder.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        if body.is_empty() {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                AppError::UnexpectedResponse(format!("Empty response body (status {})", status))
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Turn a non-2xx response into an error, keeping the server message verbatim.
/// A 404 stays an `Api` error so its message survives.
pub(crate) fn error_from_body(status: StatusCode, body: &[u8]) -> AppError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(ErrorResponse::into_message);

    tracing::warn!(
        "API returned {}: {}",
        status,
        message.as_deref().unwrap_or("<no message>")
    );

    AppError::Api {
        status: status.as_u16(),
        message,
    }
}
