use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AggregationConfig;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("aggregation base URL is not configured")]
    NotConfigured,

    #[error("aggregation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid aggregation response")]
    InvalidResponse,

    #[error("aggregation responded with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("aggregation rejected trigger request: {0}")]
    Rejected(String),
}

impl AggregationError {
    /// Message safe to hand back to the admin client.
    pub fn client_message(&self) -> String {
        let detail = match self {
            AggregationError::NotConfigured => "Aggregation service URL is not configured".to_string(),
            AggregationError::Request(e) if e.is_timeout() => "aggregation service timed out".to_string(),
            AggregationError::Request(_) => "aggregation service unreachable".to_string(),
            AggregationError::InvalidResponse => "invalid aggregation response".to_string(),
            AggregationError::Upstream { message, .. } => message.clone(),
            AggregationError::Rejected(message) => message.clone(),
        };
        format!("Failed to trigger aggregation run: {}", detail)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub source_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub message: String,
}

/// Client for the external aggregation service's trigger endpoint.
#[derive(Debug, Clone)]
pub struct AggregationClient {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl AggregationClient {
    pub fn new(config: &AggregationConfig) -> Result<Self, AggregationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        let base_url = config
            .base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Ok(Self { base_url, http })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// `POST {base}/admin/trigger`, forwarding the caller's Authorization
    /// header. Non-2xx and `success=false` are both failures.
    pub async fn trigger(
        &self,
        request: &TriggerRequest,
        authorization: Option<&str>,
    ) -> Result<TriggerResponse, AggregationError> {
        let base_url = self.base_url.as_deref().ok_or(AggregationError::NotConfigured)?;

        let mut builder = self.http.post(format!("{}/admin/trigger", base_url)).json(request);
        if let Some(auth) = authorization.map(str::trim).filter(|a| !a.is_empty()) {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = builder.send().await?;
        let status = response.status();
        let raw = response.bytes().await?;

        // Non-2xx bodies need not be JSON.
        if !status.is_success() {
            let message = serde_json::from_slice::<TriggerResponse>(&raw)
                .ok()
                .map(|body| body.message.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("aggregation responded with status {}", status.as_u16()));
            return Err(AggregationError::Upstream { status: status.as_u16(), message });
        }

        let body: TriggerResponse = serde_json::from_slice(&raw).map_err(|_| AggregationError::InvalidResponse)?;
        if !body.success {
            let message = match body.message.trim() {
                "" => "aggregation rejected trigger request".to_string(),
                m => m.to_string(),
            };
            return Err(AggregationError::Rejected(message));
        }

        tracing::info!(job_id = %body.job_id, source_type = %request.source_type, "aggregation run triggered");
        Ok(body)
    }
}
