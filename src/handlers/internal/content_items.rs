// handlers/internal/content_items.rs - ingest endpoints for the aggregation pipeline

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{ContentItem, ContentStatus};
use crate::error::ApiError;
use crate::handlers::{json_body, non_blank, parse_public_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::content_service::{ArtifactsPatch, ContentItemPatch, NewContentItem};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub id: Uuid,
    pub status: String,
    pub created: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusPatch {
    #[serde(default)]
    pub status: String,
    pub failure_reason: Option<String>,
}

/// POST /internal/content-items - idempotent on `idempotency_key`
///
/// 201 when this call stored the item, 200 when the key was already known.
pub async fn content_item_create(
    State(state): State<AppState>,
    payload: Result<Json<NewContentItem>, JsonRejection>,
) -> ApiResult<IngestResponse> {
    let item = json_body(payload, "INVALID_REQUEST")?;
    let valid = item
        .validate(&state.config.security.default_tenant_id)
        .map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;

    let (stored, created) = state.content.create_idempotent(&valid).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok(ApiResponse::with_status(
        IngestResponse {
            id: stored.public_id,
            status: stored.status,
            created,
            created_at: stored.created_at,
        },
        status,
    ))
}

/// PUT /internal/content-items/:id - refresh mutable fields
pub async fn content_item_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ContentItemPatch>, JsonRejection>,
) -> ApiResult<ContentItem> {
    let id = parse_public_id(&id, "content")?;
    let patch = json_body(payload, "INVALID_REQUEST")?;
    Ok(ApiResponse::success(state.content.update(id, &patch).await?))
}

/// PATCH /internal/content-items/:id/status
pub async fn content_item_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusPatch>, JsonRejection>,
) -> ApiResult<ContentItem> {
    let id = parse_public_id(&id, "content")?;
    let patch = json_body(payload, "INVALID_REQUEST")?;
    let status: ContentStatus = patch
        .status
        .parse()
        .map_err(|e: String| ApiError::bad_request_code(e, "INVALID_STATUS"))?;
    let reason = non_blank(patch.failure_reason.as_deref());

    let item = state.content.update_status(id, status, reason.as_deref(), None).await?;
    tracing::info!(id = %item.public_id, status = %status, "content status updated by pipeline");
    Ok(ApiResponse::success(item))
}

/// PATCH /internal/content-items/:id/artifacts - media produced after ingest
pub async fn content_item_artifacts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ArtifactsPatch>, JsonRejection>,
) -> ApiResult<ContentItem> {
    let id = parse_public_id(&id, "content")?;
    let patch = json_body(payload, "INVALID_REQUEST")?;
    if matches!(patch.duration_sec, Some(d) if d < 0) {
        return Err(ApiError::bad_request_code("duration_sec must not be negative", "INVALID_DURATION"));
    }
    Ok(ApiResponse::success(state.content.update_artifacts(id, &patch).await?))
}
