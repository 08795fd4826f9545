use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{InteractionType, UserInteraction, Viewer};
use crate::database::{DatabaseError, Repository};

#[derive(Debug, Clone, Deserialize)]
pub struct NewInteraction {
    pub content_item_id: String,
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Outcome of recording an interaction. Toggle types return the row that
/// already existed instead of inserting a second one.
#[derive(Debug, Clone)]
pub enum Recorded {
    Created(UserInteraction),
    Existing(UserInteraction),
}

#[derive(Clone)]
pub struct InteractionService {
    pool: PgPool,
}

impl InteractionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        content_item_id: Uuid,
        kind: InteractionType,
        viewer: &Viewer,
        metadata: Map<String, Value>,
    ) -> Result<Recorded, DatabaseError> {
        let item_exists: Option<(Uuid,)> = sqlx::query_as("SELECT public_id FROM content_items WHERE public_id = $1")
            .bind(content_item_id)
            .fetch_optional(&self.pool)
            .await?;
        if item_exists.is_none() {
            return Err(DatabaseError::NotFound("Content item not found".to_string()));
        }

        if kind.is_toggle() {
            if let Some(existing) = self.find_existing(content_item_id, kind, viewer).await? {
                return Ok(Recorded::Existing(existing));
            }
        }

        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, UserInteraction>(
            r#"
            INSERT INTO user_interactions (public_id, user_id, session_id, content_item_id, type, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&viewer.user_id)
        .bind(&viewer.session_id)
        .bind(content_item_id)
        .bind(kind.as_str())
        .bind(Value::Object(metadata))
        .fetch_one(&mut *tx)
        .await?;
        adjust_counter(&mut tx, content_item_id, kind, 1).await?;
        tx.commit().await?;

        Ok(Recorded::Created(created))
    }

    /// Removes the interaction and walks its counter back, never below zero.
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let interaction = Repository::<UserInteraction>::new("user_interactions", self.pool.clone())
            .find_by_public_id(id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound(_) => DatabaseError::NotFound("Interaction not found".to_string()),
                other => other,
            })?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_interactions WHERE public_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if let Ok(kind) = interaction.interaction_type.parse::<InteractionType>() {
            adjust_counter(&mut tx, interaction.content_item_id, kind, -1).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_existing(
        &self,
        content_item_id: Uuid,
        kind: InteractionType,
        viewer: &Viewer,
    ) -> Result<Option<UserInteraction>, DatabaseError> {
        let row = sqlx::query_as::<_, UserInteraction>(
            r#"
            SELECT * FROM user_interactions
            WHERE content_item_id = $1 AND type = $2
              AND ($3::text IS NULL OR session_id = $3)
              AND ($4::text IS NULL OR user_id = $4)
            LIMIT 1
            "#,
        )
        .bind(content_item_id)
        .bind(kind.as_str())
        .bind(&viewer.session_id)
        .bind(&viewer.user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

async fn adjust_counter(
    tx: &mut Transaction<'_, Postgres>,
    content_item_id: Uuid,
    kind: InteractionType,
    delta: i32,
) -> Result<(), DatabaseError> {
    let Some(column) = kind.counter_column() else {
        return Ok(());
    };
    sqlx::query(&counter_sql(column))
        .bind(delta)
        .bind(content_item_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn counter_sql(column: &str) -> String {
    format!(
        "UPDATE content_items SET \"{col}\" = GREATEST(\"{col}\" + $1, 0) WHERE public_id = $2",
        col = column
    )
}
