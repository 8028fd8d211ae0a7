//! Error types for the Bookshelf client

use serde::Deserialize;
use thiserror::Error;

use crate::models::book::FieldErrors;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The server could not be reached at all
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status, with its message if it sent one
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    /// Client-side validation failed before any request was sent
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered 2xx with a body we could not interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Connectivity failures are reported differently from server rejections
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// A 404 from the server or a local lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::Api { status: 404, .. })
    }

    /// Message the server sent with a non-2xx answer
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AppError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Message suitable for a banner or an alert
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message: Some(message), .. } => message.clone(),
            AppError::Api { status, message: None } => format!("Request failed with status {}", status),
            AppError::Authentication(message)
            | AppError::NotFound(message)
            | AppError::UnexpectedResponse(message)
            | AppError::Network(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::UnexpectedResponse(e.to_string())
        } else if e.is_builder() {
            AppError::Internal(e.to_string())
        } else {
            // connect, timeout, request and body errors all mean the exchange never completed
            AppError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::UnexpectedResponse(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

/// Error body returned by the REST API.
///
/// Validation failures come back with `message` as a list of strings.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<ErrorMessage>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorResponse {
    /// Server-provided message, if any
    pub fn into_message(self) -> Option<String> {
        match self.message {
            Some(ErrorMessage::One(msg)) if !msg.is_empty() => Some(msg),
            Some(ErrorMessage::Many(msgs)) if !msgs.is_empty() => Some(msgs.join(", ")),
            _ => self.error.filter(|e| !e.is_empty()),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
