use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{ContentSource, SourceType};
use crate::database::{DatabaseError, Repository};
use crate::query::{QueryConfig, QueryMeta, QueryParams};

#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub source_type: SourceType,
    pub feed_url: Option<String>,
    pub api_config: Map<String, Value>,
    pub is_active: bool,
    pub fetch_interval_minutes: i32,
    pub metadata: Map<String, Value>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct SourceChanges {
    pub name: Option<String>,
    pub source_type: Option<SourceType>,
    pub feed_url: Option<String>,
    pub api_config: Option<Map<String, Value>>,
    pub is_active: Option<bool>,
    pub fetch_interval_minutes: Option<i32>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Clone)]
pub struct SourceService {
    pool: PgPool,
}

impl SourceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self, tenant_id: &str) -> Repository<ContentSource> {
        Repository::new("content_sources", self.pool.clone()).scoped(tenant_id)
    }

    pub async fn list(
        &self,
        tenant_id: &str,
        params: &QueryParams,
        config: &QueryConfig,
    ) -> Result<(Vec<ContentSource>, QueryMeta), DatabaseError> {
        self.repository(tenant_id).list(params, config).await
    }

    pub async fn get(&self, tenant_id: &str, id: Uuid) -> Result<ContentSource, DatabaseError> {
        self.repository(tenant_id).find_by_public_id(id).await.map_err(not_found)
    }

    pub async fn create(&self, tenant_id: &str, source: &NewSource) -> Result<ContentSource, DatabaseError> {
        let created = sqlx::query_as::<_, ContentSource>(
            r#"
            INSERT INTO content_sources (
                public_id, tenant_id, name, type, feed_url, api_config,
                is_active, fetch_interval_minutes, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&source.name)
        .bind(source.source_type.as_str())
        .bind(&source.feed_url)
        .bind(Value::Object(source.api_config.clone()))
        .bind(source.is_active)
        .bind(source.fetch_interval_minutes)
        .bind(Value::Object(source.metadata.clone()))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(id = %created.public_id, tenant_id, "content source created");
        Ok(created)
    }

    pub async fn update(&self, tenant_id: &str, id: Uuid, changes: &SourceChanges) -> Result<ContentSource, DatabaseError> {
        sqlx::query_as::<_, ContentSource>(
            r#"
            UPDATE content_sources SET
                name = COALESCE($3, name),
                type = COALESCE($4, type),
                feed_url = COALESCE($5, feed_url),
                api_config = COALESCE($6, api_config),
                is_active = COALESCE($7, is_active),
                fetch_interval_minutes = COALESCE($8, fetch_interval_minutes),
                metadata = COALESCE($9, metadata),
                updated_at = NOW()
            WHERE public_id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&changes.name)
        .bind(changes.source_type.map(|t| t.as_str()))
        .bind(&changes.feed_url)
        .bind(changes.api_config.clone().map(Value::Object))
        .bind(changes.is_active)
        .bind(changes.fetch_interval_minutes)
        .bind(changes.metadata.clone().map(Value::Object))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(DatabaseError::NotFound(String::new())))
    }

    pub async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<(), DatabaseError> {
        self.repository(tenant_id).delete_by_public_id(id).await.map_err(not_found)
    }

    pub async fn mark_fetched(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE content_sources SET last_fetched_at = NOW(), updated_at = NOW() WHERE public_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn not_found(err: DatabaseError) -> DatabaseError {
    match err {
        DatabaseError::NotFound(_) => DatabaseError::NotFound("Source not found".to_string()),
        other => other,
    }
}
