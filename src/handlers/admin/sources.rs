// handlers/admin/sources.rs - /admin/sources (tenant scoped)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, Uri},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::AppState;
use crate::auth::AdminPrincipal;
use crate::database::models::{content_source::DEFAULT_FETCH_INTERVAL_MINUTES, ContentSource, SourceType};
use crate::error::ApiError;
use crate::handlers::{json_body, list_params, non_blank, parse_public_id};
use crate::middleware::{ApiResponse, ApiResult, PageResult, Paginated};
use crate::query::resources::CONTENT_SOURCES;
use crate::services::aggregation_service::TriggerRequest;
use crate::services::source_service::{NewSource, SourceChanges};

#[derive(Debug, Default, Deserialize)]
pub struct SourceRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub feed_url: Option<String>,
    pub api_config: Option<Value>,
    pub is_active: Option<bool>,
    pub fetch_interval_minutes: Option<i32>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RunSourceResponse {
    pub message: String,
    pub job_id: String,
}

/// `null` counts as absent; anything but an object is rejected.
fn json_object(value: Option<Value>, message: &str, code: &'static str) -> Result<Option<Map<String, Value>>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ApiError::bad_request_code(message, code)),
    }
}

fn parse_source_type(raw: &str) -> Result<SourceType, ApiError> {
    raw.parse().map_err(|e: String| ApiError::bad_request_code(e, "INVALID_TYPE"))
}

fn fetch_interval(value: Option<i32>) -> Result<Option<i32>, ApiError> {
    match value {
        Some(minutes) if minutes <= 0 => Err(ApiError::bad_request_code(
            "Fetch interval must be greater than zero",
            "INVALID_FETCH_INTERVAL",
        )),
        other => Ok(other),
    }
}

impl SourceRequest {
    fn into_new_source(self) -> Result<NewSource, ApiError> {
        let name = non_blank(self.name.as_deref())
            .ok_or_else(|| ApiError::bad_request_code("Name is required", "NAME_REQUIRED"))?;
        let source_type = non_blank(self.source_type.as_deref())
            .ok_or_else(|| ApiError::bad_request_code("Type is required", "TYPE_REQUIRED"))?;

        Ok(NewSource {
            name,
            source_type: parse_source_type(&source_type)?,
            feed_url: non_blank(self.feed_url.as_deref()),
            api_config: json_object(self.api_config, "Invalid api_config", "INVALID_API_CONFIG")?.unwrap_or_default(),
            metadata: json_object(self.metadata, "Invalid metadata", "INVALID_METADATA")?.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            fetch_interval_minutes: fetch_interval(self.fetch_interval_minutes)?
                .unwrap_or(DEFAULT_FETCH_INTERVAL_MINUTES),
        })
    }

    /// A present-but-blank name or type is an error, not a no-op.
    fn into_changes(self) -> Result<SourceChanges, ApiError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(ApiError::bad_request_code("Name cannot be empty", "NAME_REQUIRED"))
            }
            other => other.map(|n| n.trim().to_string()),
        };
        let source_type = match self.source_type {
            Some(t) if t.trim().is_empty() => {
                return Err(ApiError::bad_request_code("Type cannot be empty", "TYPE_REQUIRED"))
            }
            Some(t) => Some(parse_source_type(&t)?),
            None => None,
        };

        Ok(SourceChanges {
            name,
            source_type,
            feed_url: self.feed_url.map(|u| u.trim().to_string()),
            api_config: json_object(self.api_config, "Invalid api_config", "INVALID_API_CONFIG")?,
            metadata: json_object(self.metadata, "Invalid metadata", "INVALID_METADATA")?,
            is_active: self.is_active,
            fetch_interval_minutes: fetch_interval(self.fetch_interval_minutes)?,
        })
    }
}

/// GET /admin/sources
pub async fn sources_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    uri: Uri,
) -> PageResult<ContentSource> {
    principal.require_permission("sources:read")?;
    let params = list_params(&uri, &CONTENT_SOURCES)?;
    let (sources, meta) = state.sources.list(principal.tenant()?, &params, &CONTENT_SOURCES).await?;
    Ok(Paginated::new(sources, meta, uri.path(), uri.query()))
}

/// GET /admin/sources/:id
pub async fn source_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<ContentSource> {
    principal.require_permission("sources:read")?;
    let id = parse_public_id(&id, "source")?;
    Ok(ApiResponse::success(state.sources.get(principal.tenant()?, id).await?))
}

/// POST /admin/sources
pub async fn source_create(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    payload: Result<Json<SourceRequest>, JsonRejection>,
) -> ApiResult<ContentSource> {
    principal.require_permission("sources:write")?;
    let source = json_body(payload, "INVALID_REQUEST")?.into_new_source()?;
    Ok(ApiResponse::created(state.sources.create(principal.tenant()?, &source).await?))
}

/// PUT /admin/sources/:id
pub async fn source_update(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    payload: Result<Json<SourceRequest>, JsonRejection>,
) -> ApiResult<ContentSource> {
    principal.require_permission("sources:write")?;
    let id = parse_public_id(&id, "source")?;
    let changes = json_body(payload, "INVALID_REQUEST")?.into_changes()?;
    Ok(ApiResponse::success(state.sources.update(principal.tenant()?, id, &changes).await?))
}

/// DELETE /admin/sources/:id
pub async fn source_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    principal.require_permission("sources:write")?;
    let id = parse_public_id(&id, "source")?;
    state.sources.delete(principal.tenant()?, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /admin/sources/:id/run - ask the aggregation service to fetch now
pub async fn source_run(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<RunSourceResponse> {
    principal.require_permission("sources:run")?;
    let id = parse_public_id(&id, "source")?;
    let source = state.sources.get(principal.tenant()?, id).await?;

    if !state.aggregation.is_configured() {
        return Err(ApiError::service_unavailable(
            "Aggregation service URL is not configured",
            "AGGREGATION_NOT_CONFIGURED",
        ));
    }
    let url = source.run_url().ok_or_else(|| {
        ApiError::bad_request_code("source feed_url or api_config url is required", "SOURCE_URL_REQUIRED")
    })?;

    let request = TriggerRequest {
        source_type: source.source_type.clone(),
        url,
        name: source.name.clone(),
        settings: source.api_config.as_object().cloned().unwrap_or_default(),
    };
    let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let response = state.aggregation.trigger(&request, authorization).await?;

    if let Err(e) = state.sources.mark_fetched(source.public_id).await {
        tracing::warn!(source = %source.public_id, "failed to record last_fetched_at: {}", e);
    }

    Ok(ApiResponse::success(RunSourceResponse { message: response.message, job_id: response.job_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SourceRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let source = request(json!({"name": " Tech ", "type": "rss", "feed_url": "https://example.com/rss"}))
            .into_new_source()
            .unwrap();
        assert_eq!(source.name, "Tech");
        assert_eq!(source.source_type, SourceType::Rss);
        assert_eq!(source.fetch_interval_minutes, 60);
        assert!(source.is_active);
        assert!(source.api_config.is_empty());
    }

    #[test]
    fn test_create_validation_codes() {
        let code = |body: Value| request(body).into_new_source().unwrap_err().error_code();
        assert_eq!(code(json!({"type": "rss"})), "NAME_REQUIRED");
        assert_eq!(code(json!({"name": "x"})), "TYPE_REQUIRED");
        assert_eq!(code(json!({"name": "x", "type": "fax"})), "INVALID_TYPE");
        assert_eq!(code(json!({"name": "x", "type": "rss", "api_config": [1]})), "INVALID_API_CONFIG");
        assert_eq!(code(json!({"name": "x", "type": "rss", "metadata": "m"})), "INVALID_METADATA");
        assert_eq!(code(json!({"name": "x", "type": "rss", "fetch_interval_minutes": 0})), "INVALID_FETCH_INTERVAL");
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let err = request(json!({"name": "  "})).into_changes().unwrap_err();
        assert_eq!(err.error_code(), "NAME_REQUIRED");

        let changes = request(json!({"type": "youtube", "api_config": null})).into_changes().unwrap();
        assert_eq!(changes.source_type, Some(SourceType::Youtube));
        assert!(changes.api_config.is_none());
        assert!(changes.name.is_none());
    }
}
