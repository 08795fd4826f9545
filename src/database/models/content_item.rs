use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum!(
    ContentType {
        Article => "ARTICLE",
        Video => "VIDEO",
        Tweet => "TWEET",
        Comment => "COMMENT",
        Podcast => "PODCAST",
    }
);

text_enum!(
    /// Lifecycle of an ingested item. Only `READY` items reach the feeds.
    ContentStatus {
        Pending => "PENDING",
        Processing => "PROCESSING",
        Ready => "READY",
        Failed => "FAILED",
        Archived => "ARCHIVED",
    }
);

impl ContentType {
    /// Types shown on the For You feed.
    pub const PLAYABLE: [ContentType; 2] = [ContentType::Video, ContentType::Podcast];
    /// Types sliced under a featured article on the News feed.
    pub const RELATED: [ContentType; 2] = [ContentType::Tweet, ContentType::Comment];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentItem {
    #[serde(rename = "id")]
    pub public_id: Uuid,
    pub tenant_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub content_type: String,
    pub source: String,
    pub status: String,
    #[serde(skip_serializing)]
    pub idempotency_key: Option<String>,
    pub title: Option<String>,
    pub body_text: Option<String>,
    pub excerpt: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub original_url: Option<String>,
    pub duration_sec: Option<i32>,
    pub author: Option<String>,
    pub source_name: Option<String>,
    #[serde(skip_serializing)]
    pub source_feed_url: Option<String>,
    pub topic_tags: Vec<String>,
    pub metadata: Value,
    pub like_count: i32,
    pub comment_count: i32,
    pub share_count: i32,
    pub view_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItemView {
    #[serde(flatten)]
    pub item: ContentItem,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

impl ContentItemView {
    pub fn anonymous(item: ContentItem) -> Self {
        Self { item, is_liked: false, is_bookmarked: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_enums_parse_case_insensitively() {
        assert_eq!("ready".parse::<ContentStatus>().unwrap(), ContentStatus::Ready);
        assert_eq!(" Video ".parse::<ContentType>().unwrap(), ContentType::Video);
        let err = "DONE".parse::<ContentStatus>().unwrap_err();
        assert!(err.contains("PENDING, PROCESSING, READY, FAILED, ARCHIVED"));
    }

    #[test]
    fn test_view_flattens_item() {
        let now = Utc::now();
        let item = ContentItem {
            public_id: Uuid::new_v4(),
            tenant_id: "default".into(),
            content_type: "VIDEO".into(),
            source: "YOUTUBE".into(),
            status: "READY".into(),
            idempotency_key: Some("yt:abc".into()),
            title: Some("Clip".into()),
            body_text: None,
            excerpt: None,
            media_url: None,
            thumbnail_url: None,
            original_url: None,
            duration_sec: Some(42),
            author: None,
            source_name: None,
            source_feed_url: Some("https://example.com/feed".into()),
            topic_tags: vec![],
            metadata: Value::Object(Default::default()),
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            view_count: 0,
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(ContentItemView { item, is_liked: true, is_bookmarked: false }).unwrap();
        assert_eq!(json["type"], "VIDEO");
        assert_eq!(json["is_liked"], true);
        assert!(json.get("idempotency_key").is_none());
        assert!(json.get("public_id").is_none());
        assert!(json.get("source_feed_url").is_none());
    }
}
