use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    Json,
};

use crate::app::AppState;
use crate::database::models::Page;
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::handlers::{json_body, list_params, parse_serial_id};
use crate::middleware::{ApiResponse, ApiResult, PageResult, Paginated};
use crate::query::resources::PAGES;
use crate::services::site_service::PageInput;

fn repository(state: &AppState) -> Repository<Page> {
    Repository::new("pages", state.pool.clone())
}

fn not_found(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::NotFound(_) => ApiError::not_found("Page not found"),
        other => other.into(),
    }
}

pub async fn pages_list(State(state): State<AppState>, uri: Uri) -> PageResult<Page> {
    let params = list_params(&uri, &PAGES)?;
    let (pages, meta) = repository(&state).list(&params, &PAGES).await?;
    Ok(Paginated::new(pages, meta, uri.path(), uri.query()))
}

pub async fn page_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Page> {
    let id = parse_serial_id(&id, "page")?;
    Ok(ApiResponse::success(repository(&state).find_by_id(id).await.map_err(not_found)?))
}

pub async fn page_create(
    State(state): State<AppState>,
    payload: Result<Json<PageInput>, JsonRejection>,
) -> ApiResult<Page> {
    let input = json_body(payload, "INVALID_REQUEST")?;
    input.validate().map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;
    Ok(ApiResponse::created(state.site.create_page(&input).await?))
}

pub async fn page_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PageInput>, JsonRejection>,
) -> ApiResult<Page> {
    let id = parse_serial_id(&id, "page")?;
    let input = json_body(payload, "INVALID_REQUEST")?;
    input.validate().map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;
    Ok(ApiResponse::success(state.site.update_page(id, &input).await?))
}

pub async fn page_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_serial_id(&id, "page")?;
    repository(&state).delete_by_id(id).await.map_err(not_found)?;
    Ok(ApiResponse::<()>::no_content())
}
