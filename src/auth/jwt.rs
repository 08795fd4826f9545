use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::{normalize_list, Audience, JwtClaims};
use crate::config::SecurityConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature invalid")]
    SignatureInvalid,

    #[error("token invalid")]
    Invalid,

    #[error("JWT secret not configured")]
    SecretNotConfigured,

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Token signing and verification policy, resolved once from config.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub allowed_issuers: Vec<String>,
    pub allow_empty_issuer: bool,
    pub require_tenant_id: bool,
    pub default_tenant_id: String,
    pub expiry_hours: i64,
}

impl JwtSettings {
    pub fn from_config(security: &SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.trim().to_string(),
            issuer: security.jwt_issuer.clone(),
            audience: security.jwt_audience.clone(),
            allowed_issuers: normalize_list(&security.jwt_allowed_issuers),
            allow_empty_issuer: security.jwt_allow_empty_issuer,
            require_tenant_id: security.jwt_require_tenant_id,
            default_tenant_id: security.default_tenant_id.clone(),
            expiry_hours: security.jwt_expiry_hours,
        }
    }

    pub fn is_allowed_issuer(&self, issuer: &str) -> bool {
        let normalized = issuer.trim().to_lowercase();
        if normalized.is_empty() {
            return self.allow_empty_issuer;
        }
        self.allowed_issuers.contains(&normalized)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // any HMAC variant is accepted; RSA/EC/none headers are rejected
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation
    }
}

/// Mints an HS256 admin token.
pub fn issue_token(
    settings: &JwtSettings,
    user_id: &str,
    email: &str,
    tenant_id: &str,
    role: &str,
    permissions: &[String],
) -> Result<String, TokenError> {
    if settings.secret.is_empty() {
        return Err(TokenError::SecretNotConfigured);
    }

    let role = match role.trim().to_lowercase() {
        r if r.is_empty() => "user".to_string(),
        r => r,
    };
    let tenant_id = match tenant_id.trim() {
        "" => settings.default_tenant_id.clone(),
        t => t.to_string(),
    };

    let now = Utc::now();
    let claims = JwtClaims {
        user_id: user_id.to_string(),
        email: email.trim().to_lowercase(),
        tenant_id,
        role: role.clone(),
        roles: vec![role],
        permissions: normalize_list(permissions),
        sub: user_id.to_string(),
        iss: settings.issuer.clone(),
        aud: Some(Audience::Many(vec![settings.audience.clone()])),
        iat: Some(now.timestamp()),
        exp: Some((now + Duration::hours(settings.expiry_hours)).timestamp()),
    };

    let key = EncodingKey::from_secret(settings.secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Verifies a token and returns normalized claims.
///
/// Expiry and signature failures are reported separately from every other
/// rejection so callers can tell "refresh" from "re-login".
pub fn parse_token(token: &str, settings: &JwtSettings) -> Result<JwtClaims, TokenError> {
    if settings.secret.is_empty() {
        return Err(TokenError::SecretNotConfigured);
    }

    let key = DecodingKey::from_secret(settings.secret.as_bytes());
    let data = decode::<JwtClaims>(token, &key, &settings.validation()).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        _ => TokenError::Invalid,
    })?;
    let mut claims = data.claims;

    if !settings.is_allowed_issuer(&claims.iss) {
        tracing::debug!(issuer = %claims.iss, "rejecting token from unknown issuer");
        return Err(TokenError::Invalid);
    }

    claims.normalize();

    if !claims.has_required_fields() {
        return Err(TokenError::Invalid);
    }
    if settings.require_tenant_id && claims.tenant_id.trim().is_empty() {
        return Err(TokenError::Invalid);
    }

    Ok(claims)
}
