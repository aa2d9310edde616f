use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-wide error types with categories for better error handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// State file I/O errors (unwritable directory, disk full, rename failed)
    Storage(String),

    /// Index view rendering errors
    Template(String),

    /// Listener bind / serve errors
    Server(String),

    /// Background task failures (a blocking store task panicked or was cancelled)
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Storage(msg) => write!(f, "Storage Error: {}", msg),
            AppError::Template(msg) => write!(f, "Template Error: {}", msg),
            AppError::Server(msg) => write!(f, "Server Error: {}", msg),
            AppError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Returns a user-friendly title for the error
    pub fn title(&self) -> &str {
        match self {
            AppError::Storage(_) => "Storage Error",
            AppError::Template(_) => "Rendering Failed",
            AppError::Server(_) => "Server Problem",
            AppError::Other(_) => "Error",
        }
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        match self {
            AppError::Storage(msg)
            | AppError::Template(msg)
            | AppError::Server(msg)
            | AppError::Other(msg) => msg,
        }
    }

    /// Returns a suggested action for the user
    pub fn suggested_action(&self) -> Option<&str> {
        match self {
            AppError::Storage(_) => Some("Check disk space and permissions of the state file"),
            AppError::Template(_) => None,
            AppError::Server(_) => Some("Choose a different host or port"),
            AppError::Other(_) => None,
        }
    }
}

impl From<minijinja::Error> for AppError {
    fn from(error: minijinja::Error) -> Self {
        AppError::Template(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("{}: {}", self.title(), self.message());
        let mut body = format!("{}\n\n{}\n", self.title(), self.message());
        if let Some(action) = self.suggested_action() {
            body.push_str(action);
            body.push('\n');
        }
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
