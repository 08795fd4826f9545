use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum!(
    InteractionType {
        Like => "like",
        Bookmark => "bookmark",
        Share => "share",
        View => "view",
        Complete => "complete",
    }
);

impl InteractionType {
    /// At most one per viewer and item.
    pub fn is_toggle(&self) -> bool {
        matches!(self, InteractionType::Like | InteractionType::Bookmark)
    }

    /// Engagement counter on `content_items` moved by this interaction.
    pub fn counter_column(&self) -> Option<&'static str> {
        match self {
            InteractionType::Like => Some("like_count"),
            InteractionType::Share => Some("share_count"),
            InteractionType::View => Some("view_count"),
            InteractionType::Bookmark | InteractionType::Complete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserInteraction {
    #[serde(rename = "id")]
    pub public_id: Uuid,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub content_item_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub interaction_type: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Who is looking: a signed-in user, an anonymous session, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl Viewer {
    pub fn new(user_id: Option<&str>, session_id: Option<&str>) -> Self {
        let clean = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        Self { user_id: clean(user_id), session_id: clean(session_id) }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none() && self.session_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_columns() {
        assert_eq!(InteractionType::Like.counter_column(), Some("like_count"));
        assert_eq!(InteractionType::Bookmark.counter_column(), None);
        assert!(InteractionType::Bookmark.is_toggle());
        assert!(!InteractionType::View.is_toggle());
    }

    #[test]
    fn test_viewer_ignores_blank_ids() {
        assert!(Viewer::new(Some("  "), None).is_anonymous());
        let viewer = Viewer::new(None, Some(" s-1 "));
        assert_eq!(viewer.session_id.as_deref(), Some("s-1"));
    }
}
