// handlers/admin/login.rs - POST /admin/login

use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{issue_token, verify_password};
use crate::database::models::admin_user::is_valid_email;
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{client_key, ApiResponse, ApiResult, RateDecision};

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub tenant_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

impl LoginRequest {
    /// Returns the normalized email once both credentials are present.
    fn validate(&self) -> Result<String, ApiError> {
        let email = self.email.trim().to_lowercase();
        let password_missing = self.password.trim().is_empty();
        match (email.is_empty(), password_missing) {
            (true, true) => Err(ApiError::bad_request_code("Email and password are required", "MISSING_CREDENTIALS")),
            (true, false) => Err(ApiError::bad_request_code("Email is required", "EMAIL_REQUIRED")),
            (false, true) => Err(ApiError::bad_request_code("Password is required", "PASSWORD_REQUIRED")),
            (false, false) if !is_valid_email(&email) => {
                Err(ApiError::bad_request_code("Invalid email format", "INVALID_EMAIL_FORMAT"))
            }
            (false, false) => Ok(email),
        }
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized_code("Invalid email or password", "INVALID_CREDENTIALS")
}

/// Rate limit key: the socket peer's IP. Forwarded headers take over only
/// when the deployment says a proxy in front rewrites them.
fn limiter_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = client_key(headers);
        if !forwarded.is_empty() {
            return forwarded;
        }
    }
    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

/// POST /admin/login - exchange email and password for an admin JWT
///
/// The rate limit is checked before the body is even parsed, so malformed
/// requests count against the caller too.
pub async fn login_post(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let key = limiter_key(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.api.trust_proxy_headers,
    );
    if let RateDecision::Limited { retry_after_secs } = state.login_limiter.allow(&key) {
        tracing::warn!(key = %key, retry_after_secs, "login rate limited");
        return Err(ApiError::rate_limited(retry_after_secs));
    }

    let request = json_body(payload, "INVALID_REQUEST")?;
    let email = request.validate()?;

    let user = state.admin_users.find_by_email(&email).await?.ok_or_else(invalid_credentials)?;
    if !user.is_active {
        return Err(ApiError::unauthorized_code("Account is disabled", "ACCOUNT_DISABLED"));
    }
    if !verify_password(&request.password, &user.password_hash)? {
        tracing::debug!(user = %user.public_id, "login rejected: bad password");
        return Err(invalid_credentials());
    }

    let id = user.public_id.to_string();
    let token = issue_token(&state.jwt, &id, &user.email, &user.tenant_id, &user.role, &user.permissions)?;
    tracing::info!(user = %id, tenant_id = %user.tenant_id, "admin login");

    Ok(ApiResponse::success(LoginResponse {
        token,
        user: LoginUser {
            id,
            email: user.email,
            role: user.role,
            tenant_id: user.tenant_id,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn request(email: &str, password: &str) -> LoginRequest {
        LoginRequest { email: email.into(), password: password.into() }
    }

    #[test]
    fn test_validation_codes() {
        assert_eq!(request("", "").validate().unwrap_err().error_code(), "MISSING_CREDENTIALS");
        assert_eq!(request(" ", "pw").validate().unwrap_err().error_code(), "EMAIL_REQUIRED");
        assert_eq!(request("ops@example.com", "").validate().unwrap_err().error_code(), "PASSWORD_REQUIRED");
        assert_eq!(request("ops", "pw").validate().unwrap_err().error_code(), "INVALID_EMAIL_FORMAT");
        assert_eq!(request(" Ops@Example.com ", "pw").validate().unwrap(), "ops@example.com");
    }

    #[test]
    fn test_limiter_key_uses_peer_unless_proxy_trusted() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(limiter_key(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(limiter_key(&headers, None, false), "");

        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        assert_eq!(limiter_key(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(limiter_key(&headers, Some(peer), true), "1.2.3.4");

        // A trusted proxy that sent nothing still leaves the peer address.
        assert_eq!(limiter_key(&HeaderMap::new(), Some(peer), true), "10.0.0.9");
    }
}
