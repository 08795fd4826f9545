use serde::Deserialize;
use sqlx::PgPool;

use crate::database::models::{Media, Page, Post};
use crate::database::DatabaseError;

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaInput {
    pub url: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
}

impl PostInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&[("title", &self.title), ("content", &self.content)])
    }
}

impl PageInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&[("title", &self.title), ("content", &self.content)])
    }
}

impl MediaInput {
    pub fn validate(&self) -> Result<(), String> {
        required(&[("url", &self.url)])
    }
}

fn required(fields: &[(&str, &String)]) -> Result<(), String> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(format!("{} is required", name)),
        None => Ok(()),
    }
}

/// Writes for the plain site resources. Reads go through `Repository`.
#[derive(Clone)]
pub struct SiteService {
    pool: PgPool,
}

impl SiteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_post(&self, input: &PostInput) -> Result<Post, DatabaseError> {
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (title, content, author) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(input.title.trim())
        .bind(&input.content)
        .bind(&input.author)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    pub async fn update_post(&self, id: i64, input: &PostInput) -> Result<Post, DatabaseError> {
        sqlx::query_as::<_, Post>(
            "UPDATE posts SET title = $2, content = $3, author = $4, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.content)
        .bind(&input.author)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Post not found".to_string()))
    }

    pub async fn create_page(&self, input: &PageInput) -> Result<Page, DatabaseError> {
        let page = sqlx::query_as::<_, Page>("INSERT INTO pages (title, content) VALUES ($1, $2) RETURNING *")
            .bind(input.title.trim())
            .bind(&input.content)
            .fetch_one(&self.pool)
            .await?;
        Ok(page)
    }

    pub async fn update_page(&self, id: i64, input: &PageInput) -> Result<Page, DatabaseError> {
        sqlx::query_as::<_, Page>(
            "UPDATE pages SET title = $2, content = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Page not found".to_string()))
    }

    pub async fn create_media(&self, input: &MediaInput) -> Result<Media, DatabaseError> {
        let media = sqlx::query_as::<_, Media>("INSERT INTO media (url, type) VALUES ($1, $2) RETURNING *")
            .bind(input.url.trim())
            .bind(input.media_type.trim())
            .fetch_one(&self.pool)
            .await?;
        Ok(media)
    }
}
