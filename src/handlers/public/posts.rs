use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    Json,
};

use crate::app::AppState;
use crate::database::models::Post;
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::handlers::{json_body, list_params, parse_serial_id};
use crate::middleware::{ApiResponse, ApiResult, PageResult, Paginated};
use crate::query::resources::POSTS;
use crate::services::site_service::PostInput;

fn repository(state: &AppState) -> Repository<Post> {
    Repository::new("posts", state.pool.clone())
}

fn not_found(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::NotFound(_) => ApiError::not_found("Post not found"),
        other => other.into(),
    }
}

/// GET /api/v1/posts - filterable, sortable, searchable list
pub async fn posts_list(State(state): State<AppState>, uri: Uri) -> PageResult<Post> {
    let params = list_params(&uri, &POSTS)?;
    let (posts, meta) = repository(&state).list(&params, &POSTS).await?;
    Ok(Paginated::new(posts, meta, uri.path(), uri.query()))
}

/// GET /api/v1/posts/:id
pub async fn post_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Post> {
    let id = parse_serial_id(&id, "post")?;
    let post = repository(&state).find_by_id(id).await.map_err(not_found)?;
    Ok(ApiResponse::success(post))
}

/// POST /api/v1/posts
pub async fn post_create(
    State(state): State<AppState>,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> ApiResult<Post> {
    let input = json_body(payload, "INVALID_REQUEST")?;
    input.validate().map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;
    Ok(ApiResponse::created(state.site.create_post(&input).await?))
}

/// PUT /api/v1/posts/:id
pub async fn post_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> ApiResult<Post> {
    let id = parse_serial_id(&id, "post")?;
    let input = json_body(payload, "INVALID_REQUEST")?;
    input.validate().map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;
    Ok(ApiResponse::success(state.site.update_post(id, &input).await?))
}

/// DELETE /api/v1/posts/:id
pub async fn post_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_serial_id(&id, "post")?;
    repository(&state).delete_by_id(id).await.map_err(not_found)?;
    Ok(ApiResponse::<()>::no_content())
}
