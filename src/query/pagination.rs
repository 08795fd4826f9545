use serde::{Deserialize, Serialize};

use super::types::PaginationParams;

/// Pagination metadata derived from the total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMeta {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl QueryMeta {
    pub fn new(pagination: &PaginationParams, total: i64) -> Self {
        let PaginationParams { page, limit, offset } = pagination.normalized();
        let total_pages = if limit > 0 && total > 0 { (total - 1) / limit + 1 } else { 0 };
        Self {
            page,
            limit,
            offset,
            total,
            total_pages,
            has_next: total_pages > 0 && page < total_pages,
            has_prev: page > 1 && total > 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

const PAGING_KEYS: [&str; 3] = ["page", "limit", "offset"];

/// Builds navigation links that keep every non-paging query parameter of
/// the current request and rewrite page/limit/offset consistently.
pub fn build_pagination_links(path: &str, raw_query: Option<&str>, meta: &QueryMeta) -> QueryLinks {
    if meta.limit <= 0 {
        return QueryLinks { self_link: path.to_string(), ..Default::default() };
    }

    let preserved: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.unwrap_or_default().as_bytes())
        .into_owned()
        .filter(|(key, _)| !PAGING_KEYS.contains(&key.as_str()))
        .collect();

    let link = |page: i64| -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(preserved.iter());
        serializer.append_pair("page", &page.to_string());
        serializer.append_pair("limit", &meta.limit.to_string());
        serializer.append_pair("offset", &page.saturating_sub(1).saturating_mul(meta.limit).to_string());
        format!("{}?{}", path, serializer.finish())
    };

    let last_page = if meta.total_pages > 0 { meta.total_pages } else { 1 };

    QueryLinks {
        self_link: link(meta.page),
        next: meta.has_next.then(|| link(meta.page.saturating_add(1))),
        prev: meta.has_prev.then(|| link(meta.page.saturating_sub(1))),
        first: Some(link(1)),
        last: Some(link(last_page)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(page: i64, limit: i64, total: i64) -> QueryMeta {
        QueryMeta::new(&PaginationParams { page, limit, offset: (page - 1) * limit }, total)
    }

    #[test]
    fn test_meta_middle_page() {
        let m = meta(2, 10, 35);
        assert_eq!(m.total_pages, 4);
        assert!(m.has_next);
        assert!(m.has_prev);
    }

    #[test]
    fn test_meta_last_page() {
        let m = meta(4, 10, 35);
        assert!(!m.has_next);
        assert!(m.has_prev);
    }

    #[test]
    fn test_meta_empty_result_never_has_prev() {
        let m = meta(5, 10, 0);
        assert_eq!(m.total_pages, 0);
        assert!(!m.has_prev);
        assert!(!m.has_next);
        assert_eq!(m.page, 5);
    }

    #[test]
    fn test_meta_serializes_snake_case() {
        let value = serde_json::to_value(meta(1, 20, 1)).unwrap();
        assert_eq!(value["total_pages"], 1);
        assert_eq!(value["has_next"], false);
    }

    #[test]
    fn test_links_preserve_other_params() {
        let m = meta(2, 10, 35);
        let links = build_pagination_links("/admin/content", Some("status=READY&page=2&limit=10&offset=7"), &m);
        assert_eq!(links.self_link, "/admin/content?status=READY&page=2&limit=10&offset=10");
        assert_eq!(links.next.as_deref(), Some("/admin/content?status=READY&page=3&limit=10&offset=20"));
        assert_eq!(links.prev.as_deref(), Some("/admin/content?status=READY&page=1&limit=10&offset=0"));
        assert_eq!(links.first.as_deref(), Some("/admin/content?status=READY&page=1&limit=10&offset=0"));
        assert_eq!(links.last.as_deref(), Some("/admin/content?status=READY&page=4&limit=10&offset=30"));
    }

    #[test]
    fn test_links_saturate_on_huge_pages() {
        let m = QueryMeta {
            page: i64::MAX,
            limit: 100,
            offset: i64::MAX,
            total: i64::MAX,
            total_pages: i64::MAX,
            has_next: true,
            has_prev: true,
        };
        let links = build_pagination_links("/api/v1/posts", None, &m);
        let offset = format!("offset={}", i64::MAX);
        assert!(links.self_link.ends_with(&offset));
        assert!(links.next.is_some_and(|next| next.contains(&format!("page={}", i64::MAX))));
    }

    #[test]
    fn test_links_for_empty_result() {
        let m = meta(1, 20, 0);
        let links = build_pagination_links("/api/v1/posts", None, &m);
        assert_eq!(links.next, None);
        assert_eq!(links.prev, None);
        assert_eq!(links.last, links.first);
        assert_eq!(links.last.as_deref(), Some("/api/v1/posts?page=1&limit=20&offset=0"));

        let json = serde_json::to_value(&links).unwrap();
        assert!(json.get("next").is_none());
        assert!(json.get("self").is_some());
    }
}
