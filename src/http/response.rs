//! Error-to-response mapping.
//!
//! # Responsibilities
//! - Map every handler failure to exactly one status code
//! - Render failures as a `{type, content}` envelope
//!
//! # Status Policy
//! - unique key violation → 400
//! - malformed request body / item without `_id` → 400 (413 when too large)
//! - bulk update naming an unknown post → 404, nothing written
//! - any other repository failure → 500
//!
//! `content` is always the human-readable message; the numeric store code is
//! logged but not sent. Error responses produced by middleware (timeout, body
//! limit, unknown route) are rewritten into the same envelope.

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::model::Message;
use crate::repository::RepositoryError;

/// Failure of a post handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Json(#[from] JsonRejection),

    /// A bulk update item carried no string `_id`.
    #[error("item {index} has no string _id")]
    MissingId { index: usize },

    /// A bulk update item names a post that does not exist.
    #[error("no post with _id {id}")]
    DocumentNotFound { id: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Repository(e) if e.is_duplicate_key() => StatusCode::BAD_REQUEST,
            ApiError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Json(rejection) => rejection.status(),
            ApiError::MissingId { .. } => StatusCode::BAD_REQUEST,
            ApiError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Category reported as the envelope `type`.
    pub fn name(&self) -> &'static str {
        match self {
            ApiError::Repository(e) => e.name(),
            ApiError::Json(_) => "JsonRejection",
            ApiError::MissingId { .. } => "ValidationError",
            ApiError::DocumentNotFound { .. } => "DocumentNotFound",
        }
    }

    pub fn to_message(&self) -> Message<String> {
        Message::error(self.name(), self.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let code = match &self {
                ApiError::Repository(e) => e.code(),
                _ => None,
            };
            tracing::error!(status = %status, kind = self.name(), code = ?code, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, kind = self.name(), error = %self, "Request rejected");
        }
        (status, Json(self.to_message())).into_response()
    }
}

/// Middleware wrapping non-JSON error responses in the envelope.
pub async fn envelope_bare_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (kind, content) = match status {
        StatusCode::REQUEST_TIMEOUT => ("Timeout", "request timed out"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PayloadTooLarge", "request body too large"),
        _ => ("HttpError", status.canonical_reason().unwrap_or("request failed")),
    };
    tracing::warn!(status = %status, kind, "Request rejected by middleware");
    (status, Json(Message::error(kind, content))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_is_client_error() {
        let err = ApiError::from(RepositoryError::DuplicateKey {
            message: "E11000 duplicate key error".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_message(),
            Message::error("DuplicateKeyError", "E11000 duplicate key error")
        );
    }

    #[test]
    fn test_other_repository_errors_are_server_errors() {
        let invalid = ApiError::from(RepositoryError::InvalidId("x".into()));
        assert_eq!(invalid.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let db = ApiError::from(RepositoryError::Database {
            code: Some(91),
            message: "shutdown in progress".into(),
        });
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The message, not the code, is what the client sees.
        assert_eq!(db.to_message().content, "shutdown in progress");
    }

    #[test]
    fn test_bulk_update_errors() {
        let missing = ApiError::MissingId { index: 2 };
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.to_message(), Message::error("ValidationError", "item 2 has no string _id"));

        let unknown = ApiError::DocumentNotFound { id: "abc".into() };
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(unknown.name(), "DocumentNotFound");
    }
}
