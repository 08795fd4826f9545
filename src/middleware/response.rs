use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::query::{build_pagination_links, QueryMeta};

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code: Some(status_code) }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    /// Create a 202 Accepted response
    pub fn accepted(data: T) -> Self {
        Self::with_status(data, StatusCode::ACCEPTED)
    }

    /// Create a 204 No Content response (data will be ignored)
    pub fn no_content() -> ApiResponse<()> {
        ApiResponse::with_status((), StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        match serialize(&self.data) {
            Ok(data) => (status, Json(json!({ "success": true, "data": data }))).into_response(),
            Err(response) => response,
        }
    }
}

/// One page of a client-driven list: rows plus count metadata and
/// navigation links built from the request's own query string.
#[derive(Debug)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub meta: QueryMeta,
    pub path: String,
    pub raw_query: Option<String>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, meta: QueryMeta, path: impl Into<String>, raw_query: Option<&str>) -> Self {
        Self {
            data,
            meta,
            path: path.into(),
            raw_query: raw_query.map(str::to_string),
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        let data = match serialize(&self.data) {
            Ok(data) => data,
            Err(response) => return response,
        };
        let links = build_pagination_links(&self.path, self.raw_query.as_deref(), &self.meta);

        Json(json!({
            "success": true,
            "data": data,
            "meta": self.meta,
            "links": links,
        }))
        .into_response()
    }
}

fn serialize<T: Serialize>(data: &T) -> Result<Value, Response> {
    serde_json::to_value(data).map_err(|e| {
        tracing::error!("Failed to serialize response data: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": true,
                "message": "Failed to serialize response data",
                "code": "INTERNAL_SERVER_ERROR"
            })),
        )
            .into_response()
    })
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
pub type PageResult<T> = Result<Paginated<T>, crate::error::ApiError>;
