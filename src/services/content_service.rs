use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{ContentItem, ContentStatus, ContentType, SourceType};
use crate::database::{DatabaseError, Repository};

pub const MAX_IDEMPOTENCY_KEY_CHARS: usize = 512;

/// Trims the key and replaces anything longer than the column allows with
/// a stable digest, so very long source URLs still de-duplicate.
pub fn normalize_idempotency_key(key: &str) -> String {
    let key = key.trim();
    if key.chars().count() <= MAX_IDEMPOTENCY_KEY_CHARS {
        return key.to_string();
    }
    format!("sha256:{}", hex_digest(key))
}

fn hex_digest(input: &str) -> String {
    Sha256::digest(input.as_bytes()).iter().map(|b| format!("{:02x}", b)).collect()
}

/// Ingest payload from the aggregation pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContentItem {
    #[serde(default)]
    pub idempotency_key: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub title: String,
    pub body_text: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub source_name: String,
    pub source_feed_url: Option<String>,
    #[serde(default)]
    pub original_url: String,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_sec: Option<i32>,
    #[serde(default)]
    pub topic_tags: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub published_at: Option<String>,
}

/// A `NewContentItem` whose enums and required fields have been checked.
#[derive(Debug, Clone)]
pub struct ValidContentItem {
    pub idempotency_key: String,
    pub tenant_id: String,
    pub content_type: ContentType,
    pub source: SourceType,
    pub status: ContentStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub item: NewContentItem,
}

impl NewContentItem {
    pub fn validate(self, default_tenant_id: &str) -> Result<ValidContentItem, String> {
        let required = [
            ("idempotency_key", &self.idempotency_key),
            ("type", &self.content_type),
            ("source", &self.source),
            ("status", &self.status),
            ("title", &self.title),
            ("original_url", &self.original_url),
            ("source_name", &self.source_name),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing required fields: {}", missing.join(", ")));
        }

        let content_type = self.content_type.parse::<ContentType>()?;
        let source = self.source.parse::<SourceType>()?;
        let status = self.status.parse::<ContentStatus>()?;
        let published_at = parse_timestamp(self.published_at.as_deref());
        let tenant_id = self
            .tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(default_tenant_id)
            .to_string();

        Ok(ValidContentItem {
            idempotency_key: normalize_idempotency_key(&self.idempotency_key),
            tenant_id,
            content_type,
            source,
            status,
            published_at,
            item: self,
        })
    }
}

/// Mutable fields of an ingested item. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentItemPatch {
    pub title: Option<String>,
    pub body_text: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub source_name: Option<String>,
    pub source_feed_url: Option<String>,
    pub original_url: Option<String>,
    pub published_at: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactsPatch {
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_sec: Option<i32>,
}

/// RFC 3339 only. Unparseable input is ignored rather than rejected.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Clone)]
pub struct ContentService {
    pool: PgPool,
}

impl ContentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self, tenant_id: Option<&str>) -> Repository<ContentItem> {
        let repo = Repository::new("content_items", self.pool.clone());
        match tenant_id {
            Some(tenant) => repo.scoped(tenant),
            None => repo,
        }
    }

    pub async fn find(&self, id: Uuid, tenant_id: Option<&str>) -> Result<ContentItem, DatabaseError> {
        self.repository(tenant_id).find_by_public_id(id).await
    }

    /// Inserts the item unless its idempotency key is already known.
    /// Returns the stored row and whether this call created it.
    pub async fn create_idempotent(&self, new: &ValidContentItem) -> Result<(ContentItem, bool), DatabaseError> {
        let repo = self.repository(None);
        if let Some(existing) = repo.find_one_where("idempotency_key", new.idempotency_key.as_str()).await? {
            return Ok((existing, false));
        }

        let item = &new.item;
        let inserted = sqlx::query_as::<_, ContentItem>(
            r#"
            INSERT INTO content_items (
                public_id, tenant_id, type, source, status, idempotency_key,
                title, body_text, excerpt, author, source_name, source_feed_url,
                original_url, media_url, thumbnail_url, duration_sec, topic_tags,
                metadata, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.tenant_id)
        .bind(new.content_type.as_str())
        .bind(new.source.as_str())
        .bind(new.status.as_str())
        .bind(&new.idempotency_key)
        .bind(item.title.trim())
        .bind(&item.body_text)
        .bind(&item.excerpt)
        .bind(&item.author)
        .bind(item.source_name.trim())
        .bind(&item.source_feed_url)
        .bind(item.original_url.trim())
        .bind(&item.media_url)
        .bind(&item.thumbnail_url)
        .bind(item.duration_sec)
        .bind(&item.topic_tags)
        .bind(Value::Object(item.metadata.clone()))
        .bind(new.published_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(created) => {
                tracing::info!(id = %created.public_id, "content item ingested");
                Ok((created, true))
            }
            // Lost an insert race on the same key.
            None => repo
                .find_one_where("idempotency_key", new.idempotency_key.as_str())
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| DatabaseError::NotFound("content item not found".to_string())),
        }
    }

    pub async fn update(&self, id: Uuid, patch: &ContentItemPatch) -> Result<ContentItem, DatabaseError> {
        let published_at = parse_timestamp(patch.published_at.as_deref());
        sqlx::query_as::<_, ContentItem>(
            r#"
            UPDATE content_items SET
                title = COALESCE($2, title),
                body_text = COALESCE($3, body_text),
                excerpt = COALESCE($4, excerpt),
                author = COALESCE($5, author),
                source_name = COALESCE($6, source_name),
                source_feed_url = COALESCE($7, source_feed_url),
                original_url = COALESCE($8, original_url),
                published_at = COALESCE($9, published_at),
                metadata = COALESCE($10, metadata),
                updated_at = NOW()
            WHERE public_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.body_text)
        .bind(&patch.excerpt)
        .bind(&patch.author)
        .bind(&patch.source_name)
        .bind(&patch.source_feed_url)
        .bind(&patch.original_url)
        .bind(published_at)
        .bind(patch.metadata.clone().map(Value::Object))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Content not found".to_string()))
    }

    pub async fn update_artifacts(&self, id: Uuid, patch: &ArtifactsPatch) -> Result<ContentItem, DatabaseError> {
        sqlx::query_as::<_, ContentItem>(
            r#"
            UPDATE content_items SET
                media_url = COALESCE($2, media_url),
                thumbnail_url = COALESCE($3, thumbnail_url),
                duration_sec = COALESCE($4, duration_sec),
                updated_at = NOW()
            WHERE public_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.media_url)
        .bind(&patch.thumbnail_url)
        .bind(patch.duration_sec)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Content not found".to_string()))
    }

    /// Sets the status. A failure reason is merged into `metadata`.
    /// With a tenant, rows of other tenants are treated as missing.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ContentStatus,
        failure_reason: Option<&str>,
        tenant_id: Option<&str>,
    ) -> Result<ContentItem, DatabaseError> {
        sqlx::query_as::<_, ContentItem>(
            r#"
            UPDATE content_items SET
                status = $2,
                metadata = CASE
                    WHEN $3::text IS NULL THEN metadata
                    ELSE COALESCE(metadata, '{}'::jsonb) || jsonb_build_object('failure_reason', $3::text)
                END,
                updated_at = NOW()
            WHERE public_id = $1 AND ($4::text IS NULL OR tenant_id = $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(failure_reason)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Content not found".to_string()))
    }
}
