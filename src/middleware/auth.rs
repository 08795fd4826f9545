use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{parse_token, AdminPrincipal, TokenError};
use crate::error::ApiError;
use crate::services::AccountDirectory;

/// Bearer extraction failures, kept apart so a missing header and a
/// mangled one surface with different codes.
#[derive(Debug, PartialEq, Eq)]
pub enum BearerError {
    Missing,
    Malformed,
}

impl From<BearerError> for ApiError {
    fn from(err: BearerError) -> Self {
        match err {
            BearerError::Missing => ApiError::AuthRequired,
            BearerError::Malformed => ApiError::InvalidToken,
        }
    }
}

/// Validates the admin JWT, confirms the account still exists and is active,
/// and injects the resolved `AdminPrincipal` as a request extension. Any
/// failure ends the request here.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).map_err(|err| {
        tracing::debug!("admin auth rejected: {:?} bearer", err);
        ApiError::from(err)
    })?;

    let claims = parse_token(token, &state.jwt).map_err(|err| {
        if !matches!(err, TokenError::SecretNotConfigured) {
            tracing::debug!("admin auth rejected: {}", err);
        }
        ApiError::from(err)
    })?;

    let principal = AdminPrincipal::from_claims(claims, &state.jwt.default_tenant_id);
    check_account(state.accounts.as_ref(), &principal.user_id).await?;
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Missing accounts are 401, disabled ones 403.
pub async fn check_account(accounts: &dyn AccountDirectory, user_id: &str) -> Result<(), ApiError> {
    let unauthorized = || ApiError::unauthorized("Unauthorized");
    let public_id = Uuid::parse_str(user_id).map_err(|_| {
        tracing::debug!(user_id, "admin auth rejected: subject is not an account id");
        unauthorized()
    })?;

    match accounts.account_status(public_id).await? {
        Some(true) => Ok(()),
        Some(false) => {
            tracing::info!(%public_id, "admin auth rejected: account disabled");
            Err(ApiError::forbidden("Forbidden"))
        }
        None => {
            tracing::debug!(%public_id, "admin auth rejected: unknown account");
            Err(unauthorized())
        }
    }
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers.get(header::AUTHORIZATION).ok_or(BearerError::Missing)?;
    let value = value.to_str().map_err(|_| BearerError::Malformed)?;
    if value.is_empty() {
        return Err(BearerError::Missing);
    }

    let token = value.strip_prefix("Bearer ").ok_or(BearerError::Malformed)?.trim();
    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use async_trait::async_trait;
    use axum::http::HeaderValue;

    const ACTIVE: &str = "7d0c7a3e-0000-4000-8000-000000000001";
    const DISABLED: &str = "7d0c7a3e-0000-4000-8000-000000000002";

    struct Accounts;

    #[async_trait]
    impl AccountDirectory for Accounts {
        async fn account_status(&self, public_id: Uuid) -> Result<Option<bool>, DatabaseError> {
            Ok(match public_id.to_string().as_str() {
                ACTIVE => Some(true),
                DISABLED => Some(false),
                _ => None,
            })
        }
    }

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(BearerError::Missing));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(BearerError::Malformed));
        assert_eq!(bearer_token(&headers("Bearer   ")), Err(BearerError::Malformed));
        assert_eq!(bearer_token(&headers("Bearer abc.def ")), Ok("abc.def"));
    }

    #[test]
    fn test_bearer_errors_map_to_codes() {
        assert_eq!(ApiError::from(BearerError::Missing).error_code(), "AUTH_REQUIRED");
        assert_eq!(ApiError::from(BearerError::Malformed).error_code(), "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_check_account_states() {
        assert!(check_account(&Accounts, ACTIVE).await.is_ok());

        let disabled = check_account(&Accounts, DISABLED).await.unwrap_err();
        assert_eq!(disabled.status_code(), 403);
        assert_eq!(disabled.error_code(), "FORBIDDEN");

        let missing = check_account(&Accounts, "7d0c7a3e-0000-4000-8000-00000000ffff").await.unwrap_err();
        assert_eq!(missing.status_code(), 401);
        assert_eq!(missing.error_code(), "UNAUTHORIZED");

        let not_an_id = check_account(&Accounts, "admin@example.com").await.unwrap_err();
        assert_eq!(not_an_id.error_code(), "UNAUTHORIZED");
    }
}
