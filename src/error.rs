use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Tagged failure kinds for one generation submission, so callers branch on
/// the variant instead of matching on message text.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("API key is required.")]
    MissingApiKey,
    #[error("session not found")]
    SessionNotFound,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Gemini API error: status={status} body={body}")]
    Provider { status: u16, body: String },
    #[error("no text content found in response")]
    EmptyReply,
}

impl GenerateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerateError::MissingApiKey => StatusCode::BAD_REQUEST,
            GenerateError::SessionNotFound => StatusCode::NOT_FOUND,
            GenerateError::Http(_)
            | GenerateError::Provider { .. }
            | GenerateError::EmptyReply => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            GenerateError::MissingApiKey | GenerateError::SessionNotFound => {
                warn!("request rejected: {}", self)
            }
            _ => error!("generation failed: {}", self),
        }
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
