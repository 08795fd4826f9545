// handlers/internal/transcripts.rs - transcription worker output

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::transcript_service::NewTranscript;

#[derive(Debug, Serialize)]
pub struct TranscriptCreated {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// POST /internal/transcripts
pub async fn transcript_create(
    State(state): State<AppState>,
    payload: Result<Json<NewTranscript>, JsonRejection>,
) -> ApiResult<TranscriptCreated> {
    let transcript = json_body(payload, "INVALID_REQUEST")?
        .validate()
        .map_err(|e| ApiError::bad_request_code(e, "VALIDATION_ERROR"))?;

    let stored = state.transcripts.create(&transcript).await?;
    Ok(ApiResponse::success(TranscriptCreated {
        id: stored.public_id,
        created_at: stored.created_at,
    }))
}
