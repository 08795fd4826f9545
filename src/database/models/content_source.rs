use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum!(
    SourceType {
        Rss => "RSS",
        Website => "WEBSITE",
        Podcast => "PODCAST",
        Youtube => "YOUTUBE",
        Upload => "UPLOAD",
        Manual => "MANUAL",
    }
);

pub const DEFAULT_FETCH_INTERVAL_MINUTES: i32 = 60;

/// `api_config` keys that may carry the location to aggregate from, in
/// lookup order.
pub const API_CONFIG_URL_KEYS: [&str; 10] = [
    "url",
    "feed_url",
    "feedUrl",
    "channel_url",
    "channelUrl",
    "channel_id",
    "channelId",
    "playlist_id",
    "playlistId",
    "subreddit",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContentSource {
    #[serde(rename = "id")]
    pub public_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub source_type: String,
    pub feed_url: Option<String>,
    pub api_config: Value,
    pub is_active: bool,
    pub fetch_interval_minutes: i32,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentSource {
    /// Location handed to the aggregation service: `feed_url`, else the
    /// first non-empty string among the known `api_config` keys.
    pub fn run_url(&self) -> Option<String> {
        if let Some(url) = self.feed_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        let config = self.api_config.as_object()?;
        API_CONFIG_URL_KEYS.iter().find_map(|key| {
            config
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(feed_url: Option<&str>, api_config: Value) -> ContentSource {
        let now = Utc::now();
        ContentSource {
            public_id: Uuid::new_v4(),
            tenant_id: "default".into(),
            name: "Example".into(),
            source_type: "YOUTUBE".into(),
            feed_url: feed_url.map(str::to_string),
            api_config,
            is_active: true,
            fetch_interval_minutes: DEFAULT_FETCH_INTERVAL_MINUTES,
            last_fetched_at: None,
            metadata: json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_run_url_prefers_feed_url() {
        let s = source(Some(" https://example.com/rss "), json!({"url": "https://other"}));
        assert_eq!(s.run_url().as_deref(), Some("https://example.com/rss"));
    }

    #[test]
    fn test_run_url_falls_back_to_api_config_keys() {
        let s = source(Some("  "), json!({"channelId": "UC123", "playlist_id": "PL1"}));
        assert_eq!(s.run_url().as_deref(), Some("UC123"));

        let s = source(None, json!({"subreddit": "rust", "url": ""}));
        assert_eq!(s.run_url().as_deref(), Some("rust"));
    }

    #[test]
    fn test_run_url_missing() {
        assert_eq!(source(None, json!({"channel_id": 12})).run_url(), None);
        assert_eq!(source(None, Value::Null).run_url(), None);
    }
}
