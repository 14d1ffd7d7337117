/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; registry, password and
/// enrichment errors convert into it with `?`.
///
/// # Response body
///
/// ```json
/// {
///   "error": "duplicate_role",
///   "message": "identity ... already holds role 'admin' in organization ...",
///   "details": [{"field": "email", "message": "Invalid email format"}]
/// }
/// ```
///
/// `details` is only present for validation failures.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use talentgrid_shared::{
    credentials::PasswordError, enrichment::EnrichmentError, error::RegistryError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate role, email or application
    Conflict { code: &'static str, message: String },

    /// Unprocessable entity (422) - business rule rejected the request
    Unprocessable { code: &'static str, message: String },

    /// Unprocessable entity (422) - field validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Bad gateway (502) - the enrichment service failed
    UpstreamError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "duplicate_role")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::Unprocessable { message, .. } => write!(f, "Unprocessable: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict { code, message } => (StatusCode::CONFLICT, code, message, None),
            ApiError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message, None)
            }
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::UpstreamError(msg) => {
                tracing::warn!(error = %msg, "Enrichment service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "The enrichment service could not complete the request".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::NotFound { .. } => ApiError::NotFound(message),
            RegistryError::DuplicateRole { .. } => ApiError::Conflict {
                code: "duplicate_role",
                message,
            },
            RegistryError::DuplicateEmail(_) => ApiError::Conflict {
                code: "duplicate_email",
                message,
            },
            RegistryError::AlreadyApplied { .. } => ApiError::Conflict {
                code: "already_applied",
                message,
            },
            RegistryError::NotACompany(_) => ApiError::Unprocessable {
                code: "not_a_company",
                message,
            },
            RegistryError::InvalidInput(_) => ApiError::Unprocessable {
                code: "invalid_input",
                message,
            },
            RegistryError::Database(_) => ApiError::InternalError(message),
        }
    }
}

/// Satellite models return bare sqlx errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::InternalError(format!("Database error: {}", err))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Weak(reason) => ApiError::invalid_field("password", reason),
            other => ApiError::InternalError(format!("Password operation failed: {}", other)),
        }
    }
}

impl From<EnrichmentError> for ApiError {
    fn from(err: EnrichmentError) -> Self {
        ApiError::UpstreamError(err.to_string())
    }
}

/// Well-formed JSON of the wrong shape is a validation failure; anything else
/// about the body is a bad request
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::invalid_field("body", err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("identity 1 not found".to_string());
        assert_eq!(err.to_string(), "Not found: identity 1 not found");
    }

    #[tokio::test]
    async fn test_registry_error_mapping() {
        let (status, body) = body_of(
            RegistryError::DuplicateRole {
                identity_id: Uuid::nil(),
                organization_id: Uuid::nil(),
                role: "admin".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_role");
        assert!(body.get("details").is_none());

        let (status, body) = body_of(RegistryError::not_found("identity", Uuid::nil()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = body_of(RegistryError::NotACompany(Uuid::nil()).into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "not_a_company");

        let (status, body) = body_of(RegistryError::DuplicateEmail("a@b.c".to_string()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_email");
    }

    #[tokio::test]
    async fn test_internal_error_is_not_exposed() {
        let (status, body) =
            body_of(RegistryError::Database(sqlx::Error::PoolTimedOut).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_weak_password_is_validation_error() {
        let (status, body) = body_of(PasswordError::Weak("too short").into()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "password");
        assert_eq!(body["details"][0]["message"], "too short");
    }
}
