use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::executor;
use crate::database::models::{
    ContentItem, ContentItemView, ContentStatus, ContentType, InteractionType, UserInteraction, Viewer,
};
use crate::database::DatabaseError;
use crate::query::{encode_cursor, CursorParams, CursorPosition, PreparedQuery};

/// Related items sliced under each featured article.
pub const RELATED_PER_SLIDE: usize = 3;

/// Storage reads the feeds need. Every list is ordered newest first by
/// `(sort timestamp, public_id)`, and `after` selects rows strictly past
/// that position in the same order.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// `READY` items of the given types with a publish time.
    async fn ready_items(
        &self,
        types: &[ContentType],
        after: Option<CursorPosition>,
        limit: i64,
    ) -> Result<Vec<ContentItem>, DatabaseError>;

    /// Likes and bookmarks the viewer holds on any of `item_ids`.
    async fn viewer_interactions(
        &self,
        item_ids: &[Uuid],
        viewer: &Viewer,
    ) -> Result<Vec<(Uuid, String)>, DatabaseError>;

    /// The viewer's bookmarks, ordered by bookmark creation time.
    async fn bookmarks(
        &self,
        viewer: &Viewer,
        after: Option<CursorPosition>,
        limit: i64,
    ) -> Result<Vec<UserInteraction>, DatabaseError>;

    async fn items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ContentItem>, DatabaseError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ForYouPage {
    pub cursor: Option<String>,
    pub items: Vec<ContentItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsSlide {
    pub slide_id: Uuid,
    pub featured: ContentItem,
    pub related: Vec<ContentItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsPage {
    pub cursor: Option<String>,
    pub slides: Vec<NewsSlide>,
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn FeedStore>,
}

impl FeedService {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PgFeedStore::new(pool)))
    }

    /// Playable items, seek-paginated. Interaction flags are best effort.
    pub async fn for_you(&self, params: &CursorParams, viewer: &Viewer) -> Result<ForYouPage, DatabaseError> {
        let rows = self
            .store
            .ready_items(&ContentType::PLAYABLE, params.cursor, params.limit + 1)
            .await?;
        let (items, cursor) = split_page(rows, params.limit, |item| item.published_at.map(|t| (t, item.public_id)));

        let flags = self.interaction_flags(&items, viewer).await;
        let items = items
            .into_iter()
            .map(|item| {
                let (is_liked, is_bookmarked) = flags.get(&item.public_id).copied().unwrap_or_default();
                ContentItemView { item, is_liked, is_bookmarked }
            })
            .collect();

        Ok(ForYouPage { cursor, items })
    }

    /// Featured articles, seek-paginated, each with a positional slice of
    /// the most recent tweets and comments. A failed related fetch leaves
    /// every slide with no related items.
    pub async fn news(&self, params: &CursorParams) -> Result<NewsPage, DatabaseError> {
        let rows = self
            .store
            .ready_items(&[ContentType::Article], params.cursor, params.limit + 1)
            .await?;
        let (featured, cursor) = split_page(rows, params.limit, |item| item.published_at.map(|t| (t, item.public_id)));

        let related_limit = featured.len() * RELATED_PER_SLIDE;
        let mut related = if related_limit == 0 {
            vec![]
        } else {
            self.store
                .ready_items(&ContentType::RELATED, None, related_limit as i64)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("related items unavailable for news feed: {}", e);
                    vec![]
                })
        };

        let mut slides = Vec::with_capacity(featured.len());
        for featured in featured {
            let take = related.len().min(RELATED_PER_SLIDE);
            let slice = related.drain(..take).collect();
            slides.push(NewsSlide { slide_id: Uuid::new_v4(), featured, related: slice });
        }

        Ok(NewsPage { cursor, slides })
    }

    /// Bookmarked items for a viewer, paged by bookmark time.
    pub async fn bookmarks(&self, params: &CursorParams, viewer: &Viewer) -> Result<ForYouPage, DatabaseError> {
        let rows = self.store.bookmarks(viewer, params.cursor, params.limit + 1).await?;
        let (bookmarks, cursor) = split_page(rows, params.limit, |b| Some((b.created_at, b.public_id)));

        let ids: Vec<Uuid> = bookmarks.iter().map(|b| b.content_item_id).collect();
        let mut by_id: HashMap<Uuid, ContentItem> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.store
                .items_by_ids(&ids)
                .await?
                .into_iter()
                .map(|item| (item.public_id, item))
                .collect()
        };

        let items = ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(|item| ContentItemView { item, is_liked: false, is_bookmarked: true })
            .collect();

        Ok(ForYouPage { cursor, items })
    }

    /// Single item as seen by a viewer.
    pub async fn view_item(&self, item: ContentItem, viewer: &Viewer) -> ContentItemView {
        let flags = self.interaction_flags(std::slice::from_ref(&item), viewer).await;
        let (is_liked, is_bookmarked) = flags.get(&item.public_id).copied().unwrap_or_default();
        ContentItemView { item, is_liked, is_bookmarked }
    }

    async fn interaction_flags(&self, items: &[ContentItem], viewer: &Viewer) -> HashMap<Uuid, (bool, bool)> {
        let mut flags: HashMap<Uuid, (bool, bool)> = HashMap::new();
        if viewer.is_anonymous() || items.is_empty() {
            return flags;
        }

        let ids: Vec<Uuid> = items.iter().map(|item| item.public_id).collect();
        let rows = match self.store.viewer_interactions(&ids, viewer).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("interaction flags unavailable: {}", e);
                return flags;
            }
        };

        for (item_id, kind) in rows {
            let entry = flags.entry(item_id).or_default();
            match kind.parse::<InteractionType>() {
                Ok(InteractionType::Like) => entry.0 = true,
                Ok(InteractionType::Bookmark) => entry.1 = true,
                _ => {}
            }
        }
        flags
    }
}

/// Trims the look-ahead row and derives the next cursor from the last row
/// kept. No cursor when nothing was trimmed.
fn split_page<T>(
    mut rows: Vec<T>,
    limit: i64,
    position: impl Fn(&T) -> Option<(DateTime<Utc>, Uuid)>,
) -> (Vec<T>, Option<String>) {
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    if rows.len() <= limit {
        return (rows, None);
    }
    rows.truncate(limit);

    let cursor = rows
        .last()
        .and_then(&position)
        .map(|(timestamp, id)| encode_cursor(timestamp, id))
        .filter(|token| !token.is_empty());
    (rows, cursor)
}

pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn ready_items(
        &self,
        types: &[ContentType],
        after: Option<CursorPosition>,
        limit: i64,
    ) -> Result<Vec<ContentItem>, DatabaseError> {
        let mut query = PreparedQuery::new("content_items")?.where_eq("status", ContentStatus::Ready.as_str());
        let types: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        push_in(&mut query, "\"type\"", &types, "");
        query.push_condition("\"published_at\" IS NOT NULL".to_string());
        push_seek(&mut query, "published_at", after);

        executor::fetch_all(&self.pool, &query.to_sql(Some(limit), None)).await
    }

    async fn viewer_interactions(
        &self,
        item_ids: &[Uuid],
        viewer: &Viewer,
    ) -> Result<Vec<(Uuid, String)>, DatabaseError> {
        let mut query = PreparedQuery::new("user_interactions")?.select(&["\"content_item_id\"", "\"type\""]);
        let ids: Vec<String> = item_ids.iter().map(Uuid::to_string).collect();
        push_in(&mut query, "\"content_item_id\"", &ids, "::uuid");
        push_in(
            &mut query,
            "\"type\"",
            &[InteractionType::Like.as_str(), InteractionType::Bookmark.as_str()],
            "",
        );
        push_viewer(&mut query, viewer);

        executor::fetch_all(&self.pool, &query.to_sql(None, None)).await
    }

    async fn bookmarks(
        &self,
        viewer: &Viewer,
        after: Option<CursorPosition>,
        limit: i64,
    ) -> Result<Vec<UserInteraction>, DatabaseError> {
        let mut query =
            PreparedQuery::new("user_interactions")?.where_eq("type", InteractionType::Bookmark.as_str());
        push_viewer(&mut query, viewer);
        push_seek(&mut query, "created_at", after);

        executor::fetch_all(&self.pool, &query.to_sql(Some(limit), None)).await
    }

    async fn items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ContentItem>, DatabaseError> {
        let mut query = PreparedQuery::new("content_items")?;
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        push_in(&mut query, "\"public_id\"", &ids, "::uuid");

        executor::fetch_all(&self.pool, &query.to_sql(None, None)).await
    }
}

fn push_in<S: AsRef<str>>(query: &mut PreparedQuery, column: &str, values: &[S], cast: &str) {
    if values.is_empty() {
        query.push_condition("FALSE".to_string());
        return;
    }
    let placeholders: Vec<String> = values
        .iter()
        .map(|v| format!("{}{}", query.bind(Value::from(v.as_ref())), cast))
        .collect();
    query.push_condition(format!("{} IN ({})", column, placeholders.join(", ")));
}

/// `(ts < X OR (ts = X AND public_id < id))` plus the matching order.
fn push_seek(query: &mut PreparedQuery, column: &str, after: Option<CursorPosition>) {
    if let Some(position) = after {
        let ts = query.bind(Value::from(position.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)));
        let id = query.bind(Value::from(position.id.to_string()));
        query.push_condition(format!(
            "(\"{col}\" < {ts}::timestamptz OR (\"{col}\" = {ts}::timestamptz AND \"public_id\" < {id}::uuid))",
            col = column,
            ts = ts,
            id = id
        ));
    }
    query.push_order(format!("\"{}\" DESC", column));
    query.push_order("\"public_id\" DESC".to_string());
}

fn push_viewer(query: &mut PreparedQuery, viewer: &Viewer) {
    let mut clauses = Vec::new();
    if let Some(session_id) = &viewer.session_id {
        clauses.push(format!("\"session_id\" = {}", query.bind(Value::from(session_id.as_str()))));
    }
    if let Some(user_id) = &viewer.user_id {
        clauses.push(format!("\"user_id\" = {}", query.bind(Value::from(user_id.as_str()))));
    }
    match clauses.len() {
        0 => query.push_condition("FALSE".to_string()),
        _ => query.push_condition(format!("({})", clauses.join(" OR "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::decode_cursor;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        items: Vec<ContentItem>,
        interactions: Vec<UserInteraction>,
        fail_related: bool,
        ready_calls: Mutex<Vec<Vec<ContentType>>>,
    }

    fn before(position: Option<CursorPosition>, ts: DateTime<Utc>, id: Uuid) -> bool {
        match position {
            None => true,
            Some(p) => ts < p.timestamp || (ts == p.timestamp && id < p.id),
        }
    }

    fn matches_viewer(i: &UserInteraction, viewer: &Viewer) -> bool {
        (viewer.session_id.is_some() && i.session_id == viewer.session_id)
            || (viewer.user_id.is_some() && i.user_id == viewer.user_id)
    }

    #[async_trait]
    impl FeedStore for MemoryStore {
        async fn ready_items(
            &self,
            types: &[ContentType],
            after: Option<CursorPosition>,
            limit: i64,
        ) -> Result<Vec<ContentItem>, DatabaseError> {
            self.ready_calls.lock().unwrap().push(types.to_vec());
            if self.fail_related && types == ContentType::RELATED {
                return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
            }
            let mut rows: Vec<ContentItem> = self
                .items
                .iter()
                .filter(|i| i.status == "READY")
                .filter(|i| types.iter().any(|t| t.as_str() == i.content_type))
                .filter(|i| matches!(i.published_at, Some(ts) if before(after, ts, i.public_id)))
                .cloned()
                .collect();
            rows.sort_by(|a, b| (b.published_at, b.public_id).cmp(&(a.published_at, a.public_id)));
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn viewer_interactions(
            &self,
            item_ids: &[Uuid],
            viewer: &Viewer,
        ) -> Result<Vec<(Uuid, String)>, DatabaseError> {
            Ok(self
                .interactions
                .iter()
                .filter(|i| item_ids.contains(&i.content_item_id) && matches_viewer(i, viewer))
                .map(|i| (i.content_item_id, i.interaction_type.clone()))
                .collect())
        }

        async fn bookmarks(
            &self,
            viewer: &Viewer,
            after: Option<CursorPosition>,
            limit: i64,
        ) -> Result<Vec<UserInteraction>, DatabaseError> {
            let mut rows: Vec<UserInteraction> = self
                .interactions
                .iter()
                .filter(|i| i.interaction_type == "bookmark" && matches_viewer(i, viewer))
                .filter(|i| before(after, i.created_at, i.public_id))
                .cloned()
                .collect();
            rows.sort_by(|a, b| (b.created_at, b.public_id).cmp(&(a.created_at, a.public_id)));
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ContentItem>, DatabaseError> {
            Ok(self.items.iter().filter(|i| ids.contains(&i.public_id)).cloned().collect())
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn item(kind: ContentType, published_at: DateTime<Utc>) -> ContentItem {
        ContentItem {
            public_id: Uuid::new_v4(),
            tenant_id: "default".into(),
            content_type: kind.as_str().into(),
            source: "MANUAL".into(),
            status: ContentStatus::Ready.as_str().into(),
            idempotency_key: None,
            title: Some(format!("{} item", kind)),
            body_text: None,
            excerpt: None,
            media_url: None,
            thumbnail_url: None,
            original_url: None,
            duration_sec: None,
            author: None,
            source_name: None,
            source_feed_url: None,
            topic_tags: vec![],
            metadata: serde_json::json!({}),
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            view_count: 0,
            published_at: Some(published_at),
            created_at: published_at,
            updated_at: published_at,
        }
    }

    fn interaction(item_id: Uuid, kind: InteractionType, session: &str, at: DateTime<Utc>) -> UserInteraction {
        UserInteraction {
            public_id: Uuid::new_v4(),
            user_id: None,
            session_id: Some(session.into()),
            content_item_id: item_id,
            interaction_type: kind.as_str().into(),
            metadata: serde_json::json!({}),
            created_at: at,
        }
    }

    fn videos(n: i64) -> Vec<ContentItem> {
        (0..n).map(|i| item(ContentType::Video, base_time() - Duration::minutes(i))).collect()
    }

    fn service(store: MemoryStore) -> FeedService {
        FeedService::new(Arc::new(store))
    }

    fn params(cursor: Option<&str>, limit: i64) -> CursorParams {
        CursorParams::parse(cursor, Some(&limit.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_for_you_seek_pagination_is_disjoint_and_terminates() {
        let feed = service(MemoryStore { items: videos(25), ..Default::default() });
        let anonymous = Viewer::default();

        let first = feed.for_you(&params(None, 10), &anonymous).await.unwrap();
        assert_eq!(first.items.len(), 10);
        let cursor = first.cursor.clone().expect("first page has a cursor");

        let second = feed.for_you(&params(Some(&cursor), 10), &anonymous).await.unwrap();
        assert_eq!(second.items.len(), 10);

        let first_ids: HashSet<Uuid> = first.items.iter().map(|v| v.item.public_id).collect();
        let second_ids: HashSet<Uuid> = second.items.iter().map(|v| v.item.public_id).collect();
        assert!(first_ids.is_disjoint(&second_ids));

        let third = feed.for_you(&params(second.cursor.as_deref(), 10), &anonymous).await.unwrap();
        assert_eq!(third.items.len(), 5);
        assert_eq!(third.cursor, None);
    }

    #[tokio::test]
    async fn test_for_you_ties_broken_by_id() {
        let same_time = base_time();
        let items: Vec<ContentItem> = (0..5).map(|_| item(ContentType::Podcast, same_time)).collect();
        let feed = service(MemoryStore { items, ..Default::default() });

        let first = feed.for_you(&params(None, 3), &Viewer::default()).await.unwrap();
        let second = feed.for_you(&params(first.cursor.as_deref(), 3), &Viewer::default()).await.unwrap();
        assert_eq!(first.items.len() + second.items.len(), 5);
        assert!(second.cursor.is_none());

        let last = first.items.last().unwrap();
        let position = decode_cursor(first.cursor.as_deref().unwrap()).unwrap().unwrap();
        assert_eq!(position.id, last.item.public_id);
        assert_eq!(position.timestamp, same_time);
    }

    #[tokio::test]
    async fn test_for_you_skips_non_playable_and_non_ready() {
        let mut items = videos(2);
        items.push(item(ContentType::Article, base_time()));
        let mut pending = item(ContentType::Video, base_time());
        pending.status = ContentStatus::Pending.as_str().into();
        items.push(pending);

        let feed = service(MemoryStore { items, ..Default::default() });
        let page = feed.for_you(&params(None, 10), &Viewer::default()).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|v| v.item.content_type == "VIDEO"));
    }

    #[tokio::test]
    async fn test_for_you_flags_viewer_interactions() {
        let items = videos(2);
        let liked = items[0].public_id;
        let interactions = vec![
            interaction(liked, InteractionType::Like, "s-1", base_time()),
            interaction(liked, InteractionType::Bookmark, "s-2", base_time()),
        ];
        let feed = service(MemoryStore { items, interactions, ..Default::default() });

        let page = feed.for_you(&params(None, 10), &Viewer::new(None, Some("s-1"))).await.unwrap();
        let first = page.items.iter().find(|v| v.item.public_id == liked).unwrap();
        assert!(first.is_liked);
        assert!(!first.is_bookmarked);
        assert!(page.items.iter().filter(|v| v.item.public_id != liked).all(|v| !v.is_liked));
    }

    #[tokio::test]
    async fn test_news_slices_related_positionally() {
        let mut items: Vec<ContentItem> =
            (0..3).map(|i| item(ContentType::Article, base_time() - Duration::hours(i))).collect();
        items.extend((0..7).map(|i| item(ContentType::Tweet, base_time() - Duration::minutes(i))));

        let feed = service(MemoryStore { items, ..Default::default() });
        let page = feed.news(&params(None, 2)).await.unwrap();

        assert_eq!(page.slides.len(), 2);
        assert!(page.cursor.is_some());
        assert_eq!(page.slides[0].related.len(), 3);
        assert_eq!(page.slides[1].related.len(), 3);
        assert_ne!(page.slides[0].related[0].public_id, page.slides[1].related[0].public_id);
        assert_ne!(page.slides[0].slide_id, page.slides[1].slide_id);
    }

    #[tokio::test]
    async fn test_news_related_failure_is_swallowed() {
        let items = vec![item(ContentType::Article, base_time())];
        let feed = service(MemoryStore { items, fail_related: true, ..Default::default() });

        let page = feed.news(&params(None, 10)).await.unwrap();
        assert_eq!(page.slides.len(), 1);
        assert!(page.slides[0].related.is_empty());
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn test_news_without_articles_skips_related_fetch() {
        let store = Arc::new(MemoryStore::default());
        let feed = FeedService::new(store.clone());
        let page = feed.news(&params(None, 10)).await.unwrap();
        assert!(page.slides.is_empty());
        assert_eq!(store.ready_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bookmarks_follow_bookmark_order() {
        let items = videos(3);
        let interactions = vec![
            interaction(items[2].public_id, InteractionType::Bookmark, "s-1", base_time()),
            interaction(items[0].public_id, InteractionType::Bookmark, "s-1", base_time() - Duration::hours(1)),
            interaction(items[1].public_id, InteractionType::Bookmark, "s-9", base_time()),
        ];
        let feed = service(MemoryStore { items: items.clone(), interactions, ..Default::default() });

        let viewer = Viewer::new(None, Some("s-1"));
        let first = feed.bookmarks(&params(None, 1), &viewer).await.unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].item.public_id, items[2].public_id);
        assert!(first.items[0].is_bookmarked);

        let second = feed.bookmarks(&params(first.cursor.as_deref(), 1), &viewer).await.unwrap();
        assert_eq!(second.items[0].item.public_id, items[0].public_id);
        assert!(second.cursor.is_none());
    }

    #[test]
    fn test_seek_predicate_sql() {
        let mut query = PreparedQuery::new("content_items").unwrap();
        let position = CursorPosition { timestamp: base_time(), id: Uuid::nil() };
        push_seek(&mut query, "published_at", Some(position));
        let sql = query.to_sql(Some(11), None);
        assert_eq!(
            sql.query,
            "SELECT * FROM \"content_items\" WHERE (\"published_at\" < $1::timestamptz OR \
             (\"published_at\" = $1::timestamptz AND \"public_id\" < $2::uuid)) \
             ORDER BY \"published_at\" DESC, \"public_id\" DESC LIMIT 11"
        );
        assert_eq!(sql.params[0], Value::from("2024-06-01T12:00:00.000000000Z"));
    }
}
