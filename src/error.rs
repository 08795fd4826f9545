// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::{PasswordError, TokenError};
use crate::database::manager::DatabaseError;
use crate::query::{CursorError, QueryError};
use crate::services::aggregation_service::AggregationError;

/// HTTP API error with a status code, a machine-readable code and a
/// client-safe message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { message: String, code: &'static str },
    InvalidQuery(String),
    InvalidCursor(String),
    InvalidJson(String),

    // 401 Unauthorized
    AuthRequired,
    InvalidToken,
    TokenExpired,
    InvalidSignature,
    Unauthorized { message: String, code: &'static str },

    // 403 Forbidden
    Forbidden(String),
    TenantRequired,

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict { message: String, code: &'static str },

    // 429 Too Many Requests
    RateLimited { retry_after: u64 },

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway { message: String, code: &'static str },

    // 503 Service Unavailable
    ServiceUnavailable { message: String, code: &'static str },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. }
            | ApiError::InvalidQuery(_)
            | ApiError::InvalidCursor(_)
            | ApiError::InvalidJson(_) => 400,
            ApiError::AuthRequired
            | ApiError::InvalidToken
            | ApiError::TokenExpired
            | ApiError::InvalidSignature
            | ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden(_) | ApiError::TenantRequired => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::RateLimited { .. } => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway { .. } => 502,
            ApiError::ServiceUnavailable { .. } => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::InvalidQuery(msg) => msg,
            ApiError::InvalidCursor(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::AuthRequired => "Authentication required",
            ApiError::InvalidToken => "Invalid authentication token",
            ApiError::TokenExpired => "Token has expired",
            ApiError::InvalidSignature => "Invalid token signature",
            ApiError::Unauthorized { message, .. } => message,
            ApiError::Forbidden(msg) => msg,
            ApiError::TenantRequired => "Missing tenant scope",
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict { message, .. } => message,
            ApiError::RateLimited { .. } => "Too many login attempts, please try again later",
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway { message, .. } => message,
            ApiError::ServiceUnavailable { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. } => code,
            ApiError::InvalidQuery(_) => "INVALID_QUERY",
            ApiError::InvalidCursor(_) => "INVALID_CURSOR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::AuthRequired => "AUTH_REQUIRED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::InvalidSignature => "INVALID_SIGNATURE",
            ApiError::Unauthorized { code, .. } => code,
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::TenantRequired => "TENANT_REQUIRED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict { code, .. } => code,
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway { code, .. } => code,
            ApiError::ServiceUnavailable { code, .. } => code,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });
        if let ApiError::RateLimited { retry_after } = self {
            body["retry_after"] = json!(retry_after);
        }
        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into(), code: "BAD_REQUEST" }
    }

    pub fn bad_request_code(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::BadRequest { message: message.into(), code }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized { message: message.into(), code: "UNAUTHORIZED" }
    }

    pub fn unauthorized_code(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Unauthorized { message: message.into(), code }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Conflict { message: message.into(), code }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        ApiError::RateLimited { retry_after: retry_after.max(1) }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::BadGateway { message: message.into(), code }
    }

    pub fn service_unavailable(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::ServiceUnavailable { message: message.into(), code }
    }
}

// Convert other error types to ApiError
impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::InvalidQuery(err.to_string())
    }
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        tracing::debug!("rejecting cursor: {}", err);
        ApiError::InvalidCursor("Invalid cursor".to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::SignatureInvalid => ApiError::InvalidSignature,
            TokenError::Invalid => ApiError::InvalidToken,
            TokenError::SecretNotConfigured => {
                tracing::error!("JWT_SECRET is not configured");
                ApiError::internal_server_error("Authentication is not configured")
            }
            TokenError::Generation(msg) => {
                tracing::error!("Token generation failed: {}", msg);
                ApiError::internal_server_error("Failed to generate token")
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg, "CONFLICT"),
            DatabaseError::Sqlx(sqlx::Error::RowNotFound) => ApiError::not_found("Record not found"),
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Missing database configuration: {}", name);
                ApiError::service_unavailable("Database temporarily unavailable", "SERVICE_UNAVAILABLE")
            }
            DatabaseError::Query(err) => {
                tracing::error!("Query construction error: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::NotConfigured => {
                ApiError::service_unavailable("Aggregation service is not configured", "AGGREGATION_NOT_CONFIGURED")
            }
            other => {
                tracing::warn!("Aggregation trigger failed: {}", other);
                ApiError::bad_gateway(other.client_message(), "AGGREGATION_TRIGGER_FAILED")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(format!("Invalid request body: {}", rejection.body_text()))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();
        if let ApiError::RateLimited { retry_after } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_map_to_distinct_codes() {
        assert_eq!(ApiError::from(TokenError::Expired).error_code(), "TOKEN_EXPIRED");
        assert_eq!(ApiError::from(TokenError::SignatureInvalid).error_code(), "INVALID_SIGNATURE");
        assert_eq!(ApiError::from(TokenError::Invalid).error_code(), "INVALID_TOKEN");
        assert_eq!(ApiError::from(TokenError::SecretNotConfigured).status_code(), 500);
    }

    #[test]
    fn test_query_and_cursor_errors_are_client_errors() {
        let err = ApiError::from(QueryError::InvalidLimit);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "invalid limit parameter");
        assert_eq!(ApiError::from(CursorError::Format).error_code(), "INVALID_CURSOR");
    }

    #[test]
    fn test_row_not_found_becomes_404() {
        let err = ApiError::from(DatabaseError::Sqlx(sqlx::Error::RowNotFound));
        assert_eq!(err.status_code(), 404);
        let err = ApiError::from(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Database error occurred");
    }

    #[test]
    fn test_rate_limited_response_sets_retry_after() {
        let response = ApiError::rate_limited(0).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }
}
