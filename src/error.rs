/// Error Handling Module
///
/// One taxonomy for the whole service:
/// 1. Domain error types (validation, auth, token, database, config)
/// 2. A unified `AppError` used for control flow
/// 3. HTTP status and JSON body mapping
/// 4. Per-operation failure logging
///
/// Credential and token failures are ordinary outcomes and map to opaque
/// 4xx responses. Only store connectivity faults and internal errors are
/// treated as fatal, and those never leak their details to the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::logger::RequestId;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
}

/// Authentication outcomes returned to callers of the auth core.
///
/// `InvalidCredentials` is deliberately opaque: it is produced both for an
/// unknown email and for a wrong password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Wrong token type")]
    WrongTokenType,
    #[error("Missing authentication token")]
    MissingToken,
    #[error("User not found")]
    UserNotFound,
}

/// Token codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// User store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("Duplicate entry: {0}")]
    UniqueConstraintViolation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database connection error: {0}")]
    ConnectionPool(String),
    #[error("Database error: {0}")]
    UnexpectedError(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error is a fault rather than an expected outcome.
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Validation(_) | AppError::Auth(_) => false,
            AppError::Database(e) => !matches!(
                e,
                DatabaseError::UniqueConstraintViolation(_) | DatabaseError::NotFound(_)
            ),
            AppError::Config(_) | AppError::Internal(_) => true,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed | TokenError::InvalidSignature | TokenError::Encoding(_) => {
                AuthError::TokenInvalid
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            // Failing to sign our own claims is a fault, not a bad client token.
            TokenError::Encoding(msg) => AppError::Internal(msg),
            other => AppError::Auth(other.into()),
        }
    }
}

/// Field behind a `user_account` unique constraint. Unknown names count as email.
fn unique_violation_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.contains("username") => "username",
        _ => "email",
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                let field = unique_violation_field(db_err.constraint());
                DatabaseError::UniqueConstraintViolation(format!("{} already registered", field))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            _ => DatabaseError::UnexpectedError(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.into())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// JSON body of every error response
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `TOKEN_INVALID`
    pub code: &'static str,
    pub message: String,
    pub status: u16,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AppError {
    /// Status, code and client-safe message. Fatal errors get a fixed
    /// message; their details only go to the log.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Incorrect email or password".to_string(),
            ),
            AppError::Auth(
                AuthError::TokenExpired | AuthError::TokenInvalid | AuthError::WrongTokenType,
            ) => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".to_string(),
            ),
            AppError::Auth(e @ AuthError::MissingToken) => {
                (StatusCode::UNAUTHORIZED, "MISSING_TOKEN", e.to_string())
            }
            AppError::Auth(e @ AuthError::UserNotFound) => {
                (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND", e.to_string())
            }
            AppError::Database(e @ DatabaseError::UniqueConstraintViolation(_)) => {
                (StatusCode::CONFLICT, "DUPLICATE_ENTRY", e.to_string())
            }
            AppError::Database(e @ DatabaseError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
            }
            AppError::Database(DatabaseError::ConnectionPool(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "User store temporarily unavailable".to_string(),
            ),
            AppError::Database(DatabaseError::UnexpectedError(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "User store error".to_string(),
            ),
            AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (status, code, message) = self.classify();
        ErrorBody {
            code,
            message,
            status: status.as_u16(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_body())
    }
}

// ============================================================================
// 4. OPERATION LOGGING
// ============================================================================

/// Names the operation a handler performs so failures are logged with the
/// request they belong to.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation: &'static str,
    pub request_id: String,
}

impl OperationContext {
    pub fn new(operation: &'static str, request_id: Option<&RequestId>) -> Self {
        Self {
            operation,
            request_id: request_id
                .map(|id| id.0.clone())
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    /// Fatal errors log at `error`, expected outcomes at `warn`.
    pub fn log_error(&self, error: &AppError) {
        let (status, code, _) = error.classify();
        if error.is_fatal() {
            tracing::error!(
                request_id = %self.request_id,
                operation = self.operation,
                status = status.as_u16(),
                code,
                error = %error,
                "Operation failed"
            );
        } else {
            tracing::warn!(
                request_id = %self.request_id,
                operation = self.operation,
                status = status.as_u16(),
                code,
                error = %error,
                "Operation rejected"
            );
        }
    }
}
