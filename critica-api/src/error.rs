/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts
/// to appropriate HTTP status codes.
///
/// Two mappings carry domain semantics: the opaque activation failure is a
/// plain `NotFound` with no detail, and the `unique_review` constraint
/// violation becomes a `Conflict` so the check-then-insert race is closed by
/// the storage layer rather than a pre-check.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field-level validation failure (400)
    Validation(Vec<ValidationErrorDetail>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404) - also covers nested-resource mismatch and opaque
    /// activation failure
    NotFound(String),

    /// Conflict (409) - duplicate email, duplicate review
    Conflict(String),

    /// Upstream collaborator failure (502) - e.g. mail delivery
    Upstream(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    /// The generic not-found error used wherever no detail may leak
    pub fn not_found() -> Self {
        ApiError::NotFound("Resource not found".to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Upstream(msg) => write!(f, "Upstream failure: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Upstream(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_failure",
                    "An upstream service failed".to_string(),
                    None,
                )
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found(),
            sqlx::Error::Database(db_err) => {
                // Unique constraint violations map to conflicts
                if let Some(constraint) = db_err.constraint() {
                    if constraint == "unique_review" {
                        return ApiError::Conflict(
                            "You have already reviewed this title".to_string(),
                        );
                    }
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already registered".to_string());
                    }
                    if constraint.contains("username") {
                        return ApiError::Conflict("Username already taken".to_string());
                    }
                    if constraint.contains("slug") {
                        return ApiError::Conflict("Slug already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert policy check failures to API errors
impl From<critica_shared::auth::policy::AccessError> for ApiError {
    fn from(err: critica_shared::auth::policy::AccessError) -> Self {
        match err {
            critica_shared::auth::policy::AccessError::Unauthenticated => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            critica_shared::auth::policy::AccessError::Forbidden => {
                ApiError::Forbidden("You do not have permission to perform this action".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<critica_shared::auth::password::PasswordError> for ApiError {
    fn from(err: critica_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<critica_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: critica_shared::auth::jwt::JwtError) -> Self {
        match err {
            critica_shared::auth::jwt::JwtError::Expired => {
                ApiError::Unauthorized("Token expired".to_string())
            }
            critica_shared::auth::jwt::JwtError::InvalidIssuer { .. } => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            critica_shared::auth::jwt::JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert confirmation code errors to API errors
impl From<critica_shared::auth::confirmation::ConfirmationError> for ApiError {
    fn from(err: critica_shared::auth::confirmation::ConfirmationError) -> Self {
        ApiError::InternalError(format!("Confirmation code operation failed: {}", err))
    }
}

/// Convert mailer errors to API errors
impl From<crate::mailer::EmailError> for ApiError {
    fn from(err: crate::mailer::EmailError) -> Self {
        ApiError::Upstream(format!("Mail delivery failed: {}", err))
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
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
        ApiError::Validation(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::field("score", "11 is not in range 1..10");
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }

    #[test]
    fn test_access_error_mapping() {
        use critica_shared::auth::policy::AccessError;

        assert!(matches!(
            ApiError::from(AccessError::Unauthenticated),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(AccessError::Forbidden),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn test_row_not_found_mapping() {
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
    }
}
