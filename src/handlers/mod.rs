// handlers/mod.rs - Handler tiers
//
// public   → /api/v1/*   no authentication
// admin    → /admin/*    admin JWT (login excepted)
// internal → /internal/* shared service token

pub mod admin;
pub mod internal;
pub mod public;

use axum::{extract::rejection::JsonRejection, http::Uri, Json};
use uuid::Uuid;

use crate::error::ApiError;
use crate::query::{QueryConfig, QueryParams, QueryParser};

/// Path id of a UUID-keyed resource.
pub(crate) fn parse_public_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request_code(format!("Invalid {} ID", what), "INVALID_ID"))
}

/// Path id of a serial-keyed resource.
pub(crate) fn parse_serial_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request_code(format!("Invalid {} ID", what), "INVALID_ID"))
}

/// Parses the request's own query string against a resource config.
pub(crate) fn list_params(uri: &Uri, config: &QueryConfig) -> Result<QueryParams, ApiError> {
    Ok(QueryParser::parse(uri.query().unwrap_or_default(), config)?)
}

/// Unwraps a JSON body, mapping rejections to the given request error.
pub(crate) fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    code: &'static str,
) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("rejecting request body: {}", rejection.body_text());
        ApiError::bad_request_code("Invalid request", code)
    })
}

/// Trimmed, non-empty string or `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
