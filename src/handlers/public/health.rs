use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::database::DatabaseManager;
use crate::middleware::ApiResponse;

/// GET / - service banner and route map
pub async fn root() -> impl IntoResponse {
    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "health": "/health (public)",
            "feeds": "/api/v1/feed/foryou, /api/v1/feed/news (public)",
            "interactions": "/api/v1/interactions[/bookmarks|/:id] (public)",
            "site": "/api/v1/posts, /api/v1/pages, /api/v1/media (public)",
            "admin": "/admin/login (public), /admin/* (admin JWT)",
            "internal": "/internal/content-items[/:id] (service token)",
        }
    }))
}

/// GET /health - database ping, 503 when the pool cannot answer
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok",
            "environment": state.config.environment,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
                .into_response()
        }
    }
}
