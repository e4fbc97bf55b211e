use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use doorsign_services::auth::AuthError;
use doorsign_services::dao::base::DaoError;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Gone(String),
    QuotaExceeded(String),
    PartialFailure { delivered: u64, failed: u64 },
    Internal(String),
    Validation(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Gone(msg) => (StatusCode::GONE, "expired", msg),
            ApiError::QuotaExceeded(msg) => (StatusCode::CONFLICT, "quota_exceeded", msg),
            ApiError::PartialFailure { delivered, failed } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "partial_failure",
                format!("delivered {delivered}, failed {failed}"),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DaoError> for ApiError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DaoError::DuplicateKey(msg) => ApiError::Conflict(msg),
            DaoError::NotAMember => {
                ApiError::Forbidden("Not a member of this organization".to_string())
            }
            DaoError::AlreadyMember => {
                ApiError::Conflict("Already a member of this organization".to_string())
            }
            DaoError::NotAdmin => ApiError::Forbidden("Admin role required".to_string()),
            DaoError::SoleAdmin => ApiError::Conflict(
                "Sole admin must transfer the role or dissolve the organization".to_string(),
            ),
            DaoError::InvalidCode => ApiError::NotFound("Invalid invite code".to_string()),
            DaoError::CodeGenerationFailed => {
                ApiError::Internal("Could not generate a unique invite code".to_string())
            }
            DaoError::QuotaExceeded {
                scope,
                count,
                limit,
            } => ApiError::QuotaExceeded(format!("{scope} quota exceeded ({count}/{limit})")),
            DaoError::Expired => ApiError::Gone("Notification has expired".to_string()),
            DaoError::AlreadyReplied => {
                ApiError::Conflict("Notification was already replied to".to_string())
            }
            DaoError::PartialFailure { delivered, failed } => {
                ApiError::PartialFailure { delivered, failed }
            }
            DaoError::Validation(msg) => ApiError::Validation(msg),
            DaoError::Mongo(e) => ApiError::Internal(e.to_string()),
            DaoError::BsonSer(e) => ApiError::Internal(e.to_string()),
            DaoError::BsonDe(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::HashError(msg) => ApiError::Internal(msg),
        }
    }
}
