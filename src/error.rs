//! Error taxonomy for the lookup pipeline and its mapping onto HTTP responses.
//!
//! Every failure leaves the service as the same envelope:
//! `{ "success": false, "error": { "name", "issues": [{ "code", "path", "message" }] } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use thiserror::Error;
use tracing::{error, info};

use crate::models::MediaKind;

/// Failure talking to the upstream movie database.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: timed out")]
    Timeout { operation: String },

    #[error("{operation}: upstream returned {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation}: unexpected response shape: {reason}")]
    Shape { operation: String, reason: String },
}

impl UpstreamError {
    pub fn shape(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        UpstreamError::Shape {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            UpstreamError::Transport { operation, .. }
            | UpstreamError::Timeout { operation }
            | UpstreamError::Status { operation, .. }
            | UpstreamError::Shape { operation, .. } => operation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    NoResults,
    NoExactMatch,
    NoEpisodeMatch,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotFoundReason::NoResults => "no results",
            NotFoundReason::NoExactMatch => "no exact match",
            NotFoundReason::NoEpisodeMatch => "no episode match",
        };
        f.write_str(s)
    }
}

/// Inbound query parameter an issue is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Title,
    EpisodeTitle,
    SeasonNumber,
    EpisodeNumber,
}

impl QueryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryField::Title => "title",
            QueryField::EpisodeTitle => "episodeTitle",
            QueryField::SeasonNumber => "seasonNumber",
            QueryField::EpisodeNumber => "episodeNumber",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{field}: {reason}")]
    NotFound {
        reason: NotFoundReason,
        field: QueryField,
    },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("invalid {field}: {message}")]
    Validation {
        field: QueryField,
        code: &'static str,
        message: String,
    },

    /// The query string as a whole could not be decoded.
    #[error("malformed query string: {0}")]
    MalformedQuery(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LookupError {
    pub fn not_found(reason: NotFoundReason, field: QueryField) -> Self {
        LookupError::NotFound { reason, field }
    }

    pub fn missing(field: QueryField) -> Self {
        LookupError::Validation {
            field,
            code: "invalid_type",
            message: "Required".to_string(),
        }
    }

    pub fn empty(field: QueryField) -> Self {
        LookupError::Validation {
            field,
            code: "too_small",
            message: "String must contain at least 1 character(s)".to_string(),
        }
    }

    pub fn not_a_number(field: QueryField) -> Self {
        LookupError::Validation {
            field,
            code: "invalid_string",
            message: "Expected a non-negative integer".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub name: &'static str,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Serialize)]
pub struct Issue {
    pub code: &'static str,
    pub path: Vec<&'static str>,
    pub message: String,
}

impl ErrorEnvelope {
    fn single(
        name: &'static str,
        code: &'static str,
        path: Vec<&'static str>,
        message: String,
    ) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                name,
                issues: vec![Issue {
                    code,
                    path,
                    message,
                }],
            },
        }
    }
}

/// A [`LookupError`] bound to the route it happened on, ready to become a response.
#[derive(Debug)]
pub struct ApiError {
    pub kind: MediaKind,
    pub error: LookupError,
}

impl ApiError {
    pub fn new(kind: MediaKind, error: impl Into<LookupError>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            LookupError::NotFound { .. } => StatusCode::NOT_FOUND,
            LookupError::Validation { .. } | LookupError::MalformedQuery(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LookupError::Upstream(_) | LookupError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match &self.error {
            LookupError::NotFound { reason, field } => ErrorEnvelope::single(
                "NotFoundError",
                "not_found",
                vec![field.as_str()],
                not_found_message(self.kind, *reason).to_string(),
            ),
            LookupError::Validation {
                field,
                code,
                message,
            } => ErrorEnvelope::single(
                "ValidationError",
                *code,
                vec![field.as_str()],
                message.clone(),
            ),
            LookupError::MalformedQuery(_) => ErrorEnvelope::single(
                "ValidationError",
                "invalid_query",
                Vec::new(),
                "Malformed query string".to_string(),
            ),
            LookupError::Upstream(_) | LookupError::Internal(_) => ErrorEnvelope::single(
                "InternalError",
                "internal_error",
                Vec::new(),
                format!("Failed to search {}", self.kind.label()),
            ),
        }
    }
}

/// Turns a caught handler panic into the `InternalError` response for `kind`.
pub fn panic_response(kind: MediaKind, payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::new(kind, LookupError::Internal(format!("panic: {detail}"))).into_response()
}

fn not_found_message(kind: MediaKind, reason: NotFoundReason) -> &'static str {
    match (kind, reason) {
        (MediaKind::Movie, NotFoundReason::NoResults) => "No movies found with this title",
        (MediaKind::Movie, NotFoundReason::NoExactMatch) => "No exact movie title match found",
        (MediaKind::Tv, NotFoundReason::NoResults) => "No TV shows found with this title",
        (MediaKind::Tv, NotFoundReason::NoExactMatch) => "No exact TV show match found",
        (_, NotFoundReason::NoEpisodeMatch) => "No episode found with this title",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.error {
            LookupError::NotFound { reason, field } => {
                info!(kind = %self.kind, %field, %reason, "Lookup found nothing");
            }
            LookupError::Validation { field, message, .. } => {
                info!(kind = %self.kind, %field, "Rejected query: {}", message);
            }
            LookupError::MalformedQuery(detail) => {
                info!(kind = %self.kind, "Rejected malformed query: {}", detail);
            }
            LookupError::Upstream(e) => {
                error!(kind = %self.kind, operation = e.operation(), "Upstream failure: {}", e);
            }
            LookupError::Internal(msg) => {
                error!(kind = %self.kind, "Internal failure: {}", msg);
            }
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn envelope_json(err: &ApiError) -> Value {
        serde_json::to_value(err.envelope()).unwrap()
    }

    #[test]
    fn not_found_maps_to_404_with_field_path() {
        let err = ApiError::new(
            MediaKind::Movie,
            LookupError::not_found(NotFoundReason::NoResults, QueryField::Title),
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            envelope_json(&err),
            json!({
                "success": false,
                "error": {
                    "name": "NotFoundError",
                    "issues": [{
                        "code": "not_found",
                        "path": ["title"],
                        "message": "No movies found with this title"
                    }]
                }
            })
        );
    }

    #[test]
    fn episode_not_found_points_at_episode_title() {
        let err = ApiError::new(
            MediaKind::Tv,
            LookupError::not_found(NotFoundReason::NoEpisodeMatch, QueryField::EpisodeTitle),
        );
        let body = envelope_json(&err);
        assert_eq!(body["error"]["issues"][0]["path"], json!(["episodeTitle"]));
        assert_eq!(
            body["error"]["issues"][0]["message"],
            "No episode found with this title"
        );
    }

    #[test]
    fn upstream_failure_maps_to_internal_error_with_empty_path() {
        let err = ApiError::new(
            MediaKind::Tv,
            UpstreamError::Timeout {
                operation: "search tv".to_string(),
            },
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = envelope_json(&err);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["name"], "InternalError");
        assert_eq!(body["error"]["issues"][0]["path"], json!([]));
        assert_eq!(
            body["error"]["issues"][0]["message"],
            "Failed to search TV show"
        );
    }

    #[test]
    fn upstream_details_are_not_exposed() {
        let err = ApiError::new(
            MediaKind::Movie,
            UpstreamError::Status {
                operation: "movie details".to_string(),
                status: 401,
                body: "invalid token secret-ish".to_string(),
            },
        );
        let body = envelope_json(&err).to_string();
        assert!(!body.contains("secret-ish"));
        assert!(!body.contains("401"));
    }

    #[test]
    fn validation_maps_to_422() {
        let err = ApiError::new(MediaKind::Movie, LookupError::empty(QueryField::Title));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = envelope_json(&err);
        assert_eq!(body["error"]["name"], "ValidationError");
        assert_eq!(body["error"]["issues"][0]["code"], "too_small");
    }

    #[test]
    fn malformed_query_has_empty_path() {
        let err = ApiError::new(
            MediaKind::Tv,
            LookupError::MalformedQuery("duplicate field `seasonNumber`".to_string()),
        );
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = envelope_json(&err);
        assert_eq!(body["error"]["name"], "ValidationError");
        assert_eq!(body["error"]["issues"][0]["path"], json!([]));
    }

    #[test]
    fn panic_payload_becomes_internal_error() {
        let response = panic_response(MediaKind::Tv, Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn into_response_keeps_status() {
        let response = ApiError::new(
            MediaKind::Movie,
            LookupError::Internal("boom".to_string()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
