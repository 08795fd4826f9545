use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    Json,
};

use crate::app::AppState;
use crate::database::models::Media;
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::handlers::{json_body, list_params, parse_serial_id};
use crate::middleware::{ApiResponse, ApiResult, PageResult, Paginated};
use crate::query::resources::MEDIA;
use crate::services::site_service::MediaInput;

fn repository(state: &AppState) -> Repository<Media> {
    Repository::new("media", state.pool.clone())
}

fn not_found(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::NotFound(_) => ApiError::not_found("Media not found"),
        other => other.into(),
    }
}

/// GET /api/v1/media
pub async fn media_list(State(state): State<AppState>, uri: Uri) -> PageResult<Media> {
    let params = list_params(&uri, &MEDIA)?;
    let (media, meta) = repository(&state).list(&params, &MEDIA).await?;
    Ok(Paginated::new(media, meta, uri.path(), uri.query()))
}

/// GET /api/v1/media/:id
pub async fn media_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Media> {
    let id = parse_serial_id(&id, "media")?;
    Ok(ApiResponse::success(repository(&state).find_by_id(id).await.map_err(not_found)?))
}

/// POST /api/v1/media
pub async fn media_create(
    State(state): State<AppState>,
    payload: Result<Json<MediaInput>, JsonRejection>,
) -> ApiResult<Media> {
    let input = json_body(payload, "INVALID_REQUEST")?;
    input.validate().map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;
    Ok(ApiResponse::created(state.site.create_media(&input).await?))
}

/// DELETE /api/v1/media/:id
pub async fn media_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_serial_id(&id, "media")?;
    repository(&state).delete_by_id(id).await.map_err(not_found)?;
    Ok(ApiResponse::<()>::no_content())
}
