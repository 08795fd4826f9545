use axum::extract::{Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Viewer;
use crate::middleware::{ApiResponse, ApiResult};
use crate::query::CursorParams;
use crate::services::feed_service::{ForYouPage, NewsPage};

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub cursor: Option<String>,
    pub limit: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl FeedQuery {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.user_id.as_deref(), self.session_id.as_deref())
    }
}

/// GET /api/v1/feed/foryou - playable items, newest first
pub async fn for_you(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> ApiResult<ForYouPage> {
    let limits = &state.config.query;
    let params = CursorParams::parse_with_limits(
        query.cursor.as_deref(),
        query.limit.as_deref(),
        limits.feed_default_limit,
        limits.feed_max_limit,
    )?;

    let page = state.feed.for_you(&params, &query.viewer()).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/v1/feed/news - featured articles with related slices
pub async fn news(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> ApiResult<NewsPage> {
    let limits = &state.config.query;
    let params = CursorParams::parse_with_limits(
        query.cursor.as_deref(),
        query.limit.as_deref(),
        limits.news_default_slides,
        limits.news_max_slides,
    )?;

    let page = state.feed.news(&params).await?;
    Ok(ApiResponse::success(page))
}
