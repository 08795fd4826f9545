use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::auth::bearer_token;
use crate::app::AppState;
use crate::error::ApiError;

/// Shared-secret check for service-to-service routes.
pub async fn internal_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.security.service_token.trim();
    if expected.is_empty() {
        return Err(ApiError::unauthorized_code(
            "CMS_SERVICE_TOKEN not configured",
            "SERVICE_TOKEN_NOT_CONFIGURED",
        ));
    }

    let token = bearer_token(request.headers())
        .map_err(|_| ApiError::unauthorized_code("Missing service token", "AUTH_REQUIRED"))?;

    if !tokens_match(token, expected) {
        tracing::warn!("internal request rejected: service token mismatch");
        return Err(ApiError::forbidden("Invalid service token"));
    }

    Ok(next.run(request).await)
}

// Digests first so the comparison length never depends on the input.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}
