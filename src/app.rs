use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::JwtSettings;
use crate::config::AppConfig;
use crate::handlers::{admin, internal, public};
use crate::middleware::{admin_auth_middleware, internal_auth_middleware, LoginRateLimiter, SharedRateLimiter};
use crate::services::{
    AccountDirectory, AdminUserService, AggregationClient, AggregationError, ContentService, FeedService, InteractionService,
    SiteService, SourceService, TranscriptService,
};

/// Everything a handler can reach. Built once at startup; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtSettings,
    pub login_limiter: SharedRateLimiter,
    pub aggregation: AggregationClient,
    pub feed: FeedService,
    pub content: ContentService,
    pub interactions: InteractionService,
    pub admin_users: AdminUserService,
    pub accounts: Arc<dyn AccountDirectory>,
    pub sources: SourceService,
    pub site: SiteService,
    pub transcripts: TranscriptService,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, AggregationError> {
        let login_limiter = LoginRateLimiter::shared(
            config.api.login_rate_limit_attempts,
            Duration::from_secs(config.api.login_rate_limit_window_secs),
        );
        Ok(Self {
            jwt: JwtSettings::from_config(&config.security),
            aggregation: AggregationClient::new(&config.aggregation)?,
            feed: FeedService::postgres(pool.clone()),
            content: ContentService::new(pool.clone()),
            interactions: InteractionService::new(pool.clone()),
            admin_users: AdminUserService::new(pool.clone()),
            accounts: Arc::new(AdminUserService::new(pool.clone())),
            sources: SourceService::new(pool.clone()),
            site: SiteService::new(pool.clone()),
            transcripts: TranscriptService::new(pool.clone()),
            login_limiter,
            config: Arc::new(config),
            pool,
        })
    }

    /// Swaps the account lookup used by the admin middleware.
    pub fn with_accounts(mut self, accounts: Arc<dyn AccountDirectory>) -> Self {
        self.accounts = accounts;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest("/api/v1", public_routes())
        .nest("/admin", admin_routes(state.clone()))
        .nest("/internal", internal_routes(state.clone()))
        .layer(cors_layer(&state.config.security.cors_origins));
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/feed/foryou", get(public::feed_for_you))
        .route("/feed/news", get(public::feed_news))
        .route("/content/:id", get(public::content_get))
        .route("/interactions", post(public::interaction_create))
        .route("/interactions/bookmarks", get(public::bookmarks_get))
        .route("/interactions/:id", delete(public::interaction_delete))
        .route("/posts", get(public::posts_list).post(public::post_create))
        .route(
            "/posts/:id",
            get(public::post_get).put(public::post_update).delete(public::post_delete),
        )
        .route("/pages", get(public::pages_list).post(public::page_create))
        .route(
            "/pages/:id",
            get(public::page_get).put(public::page_update).delete(public::page_delete),
        )
        .route("/media", get(public::media_list).post(public::media_create))
        .route("/media/:id", get(public::media_get).delete(public::media_delete))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(admin::me_get))
        .route("/users", get(admin::users_list).post(admin::user_create))
        .route(
            "/users/:id",
            get(admin::user_get).put(admin::user_update).delete(admin::user_delete),
        )
        .route("/users/:id/reset-password", post(admin::user_reset_password))
        .route("/sources", get(admin::sources_list).post(admin::source_create))
        .route(
            "/sources/:id",
            get(admin::source_get).put(admin::source_update).delete(admin::source_delete),
        )
        .route("/sources/:id/run", post(admin::source_run))
        .route("/content", get(admin::content_list))
        .route("/content/:id", get(admin::content_get))
        .route("/content/:id/status", patch(admin::content_status_patch))
        .route_layer(from_fn_with_state(state, admin_auth_middleware));

    Router::new().route("/login", post(admin::login_post)).merge(protected)
}

fn internal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/content-items", post(internal::content_item_create))
        .route("/content-items/:id", put(internal::content_item_update))
        .route("/content-items/:id/status", patch(internal::content_item_status))
        .route("/content-items/:id/artifacts", patch(internal::content_item_artifacts))
        .route("/transcripts", post(internal::transcript_create))
        .route_layer(from_fn_with_state(state, internal_auth_middleware))
}

/// Configured origins, or permissive when none parse.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    if allowed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
