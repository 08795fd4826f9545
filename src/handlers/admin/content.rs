use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    Extension, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::AdminPrincipal;
use crate::database::models::{ContentItem, ContentStatus};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::handlers::{json_body, list_params, parse_public_id};
use crate::middleware::{ApiResponse, ApiResult, PageResult, Paginated};
use crate::query::resources::CONTENT_ADMIN;

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

fn not_found(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::NotFound(_) => ApiError::not_found("Content not found"),
        other => other.into(),
    }
}

/// GET /admin/content
pub async fn content_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    uri: Uri,
) -> PageResult<ContentItem> {
    principal.require_permission("content:read")?;
    let params = list_params(&uri, &CONTENT_ADMIN)?;
    let repository = Repository::<ContentItem>::new("content_items", state.pool.clone()).scoped(principal.tenant()?);
    let (items, meta) = repository.list(&params, &CONTENT_ADMIN).await?;
    Ok(Paginated::new(items, meta, uri.path(), uri.query()))
}

/// GET /admin/content/:id
pub async fn content_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<ContentItem> {
    principal.require_permission("content:read")?;
    let id = parse_public_id(&id, "content")?;
    let item = state.content.find(id, Some(principal.tenant()?)).await.map_err(not_found)?;
    Ok(ApiResponse::success(item))
}

/// PATCH /admin/content/:id/status - moderation status change
pub async fn content_status_patch(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<ContentItem> {
    principal.require_permission("content:write")?;
    let id = parse_public_id(&id, "content")?;
    let request = json_body(payload, "INVALID_REQUEST")?;
    if request.status.trim().is_empty() {
        return Err(ApiError::bad_request_code("Status is required", "STATUS_REQUIRED"));
    }
    let status: ContentStatus = request
        .status
        .parse()
        .map_err(|e: String| ApiError::bad_request_code(e, "INVALID_STATUS"))?;

    let item = state
        .content
        .update_status(id, status, None, Some(principal.tenant()?))
        .await
        .map_err(not_found)?;
    tracing::info!(id = %item.public_id, status = %status, by = %principal.user_id, "content status changed");
    Ok(ApiResponse::success(item))
}
