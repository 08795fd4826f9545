use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};

use super::feed::FeedQuery;
use crate::app::AppState;
use crate::database::models::{InteractionType, UserInteraction, Viewer};
use crate::error::ApiError;
use crate::handlers::{json_body, parse_public_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::CursorParams;
use crate::services::feed_service::ForYouPage;
use crate::services::interaction_service::{NewInteraction, Recorded};

fn require_viewer(viewer: Viewer) -> Result<Viewer, ApiError> {
    if viewer.is_anonymous() {
        return Err(ApiError::bad_request_code(
            "Either session_id or user_id is required",
            "VIEWER_REQUIRED",
        ));
    }
    Ok(viewer)
}

/// POST /api/v1/interactions - record like/bookmark/share/view/complete
///
/// `like` and `bookmark` are idempotent per viewer: a repeat returns the
/// existing row with 200 instead of 201.
pub async fn interaction_create(
    State(state): State<AppState>,
    payload: Result<Json<NewInteraction>, JsonRejection>,
) -> ApiResult<UserInteraction> {
    let body = json_body(payload, "INVALID_REQUEST")?;

    let content_item_id = uuid::Uuid::parse_str(body.content_item_id.trim())
        .map_err(|_| ApiError::bad_request_code("Invalid content_item_id", "INVALID_CONTENT_ITEM_ID"))?;
    let kind: InteractionType = body
        .interaction_type
        .parse()
        .map_err(|e: String| ApiError::bad_request_code(e, "INVALID_INTERACTION_TYPE"))?;
    let viewer = require_viewer(Viewer::new(body.user_id.as_deref(), body.session_id.as_deref()))?;

    match state.interactions.record(content_item_id, kind, &viewer, body.metadata).await? {
        Recorded::Created(interaction) => Ok(ApiResponse::created(interaction)),
        Recorded::Existing(interaction) => Ok(ApiResponse::success(interaction)),
    }
}

/// GET /api/v1/interactions/bookmarks - the viewer's bookmarks, newest first
pub async fn bookmarks_get(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> ApiResult<ForYouPage> {
    let viewer = require_viewer(query.viewer())?;
    let limits = &state.config.query;
    let params = CursorParams::parse_with_limits(
        query.cursor.as_deref(),
        query.limit.as_deref(),
        limits.feed_default_limit,
        limits.feed_max_limit,
    )?;

    Ok(ApiResponse::success(state.feed.bookmarks(&params, &viewer).await?))
}

/// DELETE /api/v1/interactions/:id - unlike / unbookmark
pub async fn interaction_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_public_id(&id, "interaction")?;
    state.interactions.delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
