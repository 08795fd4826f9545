use axum::extract::{Path, Query, State};

use super::feed::FeedQuery;
use crate::app::AppState;
use crate::database::models::ContentItemView;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::parse_public_id;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/v1/content/:id - one item with the viewer's flags
pub async fn content_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<ContentItemView> {
    let id = parse_public_id(&id, "content")?;
    let item = state.content.find(id, None).await.map_err(|e| match e {
        DatabaseError::NotFound(_) => ApiError::not_found("Content not found"),
        other => other.into(),
    })?;

    Ok(ApiResponse::success(state.feed.view_item(item, &query.viewer()).await))
}
