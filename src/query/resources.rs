// Query surfaces for every list endpoint
use once_cell::sync::Lazy;

use super::error::QueryError;
use super::types::{Column, FilterOp, QueryConfig, SortParam};
use crate::config;

fn base_config() -> QueryConfig {
    let limits = &config::config().query;
    QueryConfig::new().limits(limits.default_limit, limits.max_limit)
}

pub static CONTENT_ADMIN: Lazy<QueryConfig> = Lazy::new(|| {
    base_config()
        .sortable("created_at", Column::timestamp("content_items.created_at"))
        .sortable("updated_at", Column::timestamp("content_items.updated_at"))
        .sortable("published_at", Column::timestamp("content_items.published_at"))
        .sortable("title", Column::text("content_items.title"))
        .sortable("type", Column::text("content_items.type"))
        .sortable("status", Column::text("content_items.status"))
        .filterable("status", Column::text("content_items.status"))
        .filterable("type", Column::text("content_items.type"))
        .filterable("source_id", Column::text("content_items.source_feed_url"))
        .filterable("source_name", Column::text("content_items.source_name"))
        .filterable("created_at", Column::timestamp("content_items.created_at"))
        .filterable("published_at", Column::timestamp("content_items.published_at"))
        .searchable("title", Column::text("content_items.title"))
        .searchable("excerpt", Column::text("content_items.excerpt"))
        .searchable("author", Column::text("content_items.author"))
        .default_sort(SortParam::desc("published_at"))
        .default_operator("title", FilterOp::Contains)
        .default_operator("excerpt", FilterOp::Contains)
        .default_operator("author", FilterOp::Contains)
});

pub static CONTENT_SOURCES: Lazy<QueryConfig> = Lazy::new(|| {
    base_config()
        .sortable("created_at", Column::timestamp("content_sources.created_at"))
        .sortable("updated_at", Column::timestamp("content_sources.updated_at"))
        .sortable("name", Column::text("content_sources.name"))
        .sortable("type", Column::text("content_sources.type"))
        .sortable("last_fetched_at", Column::timestamp("content_sources.last_fetched_at"))
        .filterable("name", Column::text("content_sources.name"))
        .filterable("type", Column::text("content_sources.type"))
        .filterable("is_active", Column::boolean("content_sources.is_active"))
        .filterable("created_at", Column::timestamp("content_sources.created_at"))
        .filterable("updated_at", Column::timestamp("content_sources.updated_at"))
        .searchable("name", Column::text("content_sources.name"))
        .searchable("feed_url", Column::text("content_sources.feed_url"))
        .default_sort(SortParam::desc("created_at"))
        .default_operator("name", FilterOp::Contains)
        .default_operator("feed_url", FilterOp::Contains)
});

pub static ADMIN_USERS: Lazy<QueryConfig> = Lazy::new(|| {
    base_config()
        .sortable("created_at", Column::timestamp("admin_users.created_at"))
        .sortable("updated_at", Column::timestamp("admin_users.updated_at"))
        .sortable("email", Column::text("admin_users.email"))
        .sortable("role", Column::text("admin_users.role"))
        .filterable("role", Column::text("admin_users.role"))
        .filterable("is_active", Column::boolean("admin_users.is_active"))
        .filterable("email", Column::text("admin_users.email"))
        .searchable("email", Column::text("admin_users.email"))
        .default_sort(SortParam::desc("created_at"))
        .default_operator("email", FilterOp::Contains)
});

pub static POSTS: Lazy<QueryConfig> = Lazy::new(|| {
    base_config()
        .sortable("created_at", Column::timestamp("posts.created_at"))
        .sortable("updated_at", Column::timestamp("posts.updated_at"))
        .sortable("title", Column::text("posts.title"))
        .sortable("author", Column::text("posts.author"))
        .filterable("title", Column::text("posts.title"))
        .filterable("author", Column::text("posts.author"))
        .filterable("created_at", Column::timestamp("posts.created_at"))
        .searchable("title", Column::text("posts.title"))
        .searchable("content", Column::text("posts.content"))
        .searchable("author", Column::text("posts.author"))
        .default_sort(SortParam::desc("created_at"))
});

pub static PAGES: Lazy<QueryConfig> = Lazy::new(|| {
    base_config()
        .sortable("created_at", Column::timestamp("pages.created_at"))
        .sortable("updated_at", Column::timestamp("pages.updated_at"))
        .sortable("title", Column::text("pages.title"))
        .filterable("title", Column::text("pages.title"))
        .filterable("created_at", Column::timestamp("pages.created_at"))
        .searchable("title", Column::text("pages.title"))
        .searchable("content", Column::text("pages.content"))
        .default_sort(SortParam::desc("created_at"))
});

pub static MEDIA: Lazy<QueryConfig> = Lazy::new(|| {
    base_config()
        .sortable("created_at", Column::timestamp("media.created_at"))
        .sortable("type", Column::text("media.type"))
        .filterable("type", Column::text("media.type"))
        .filterable("url", Column::text("media.url"))
        .filterable("created_at", Column::timestamp("media.created_at"))
        .searchable("url", Column::text("media.url"))
        .default_sort(SortParam::desc("created_at"))
});

/// Looks up a resource config by its route name.
pub fn resource_config(name: &str) -> Result<&'static QueryConfig, QueryError> {
    match name {
        "content" => Ok(&*CONTENT_ADMIN),
        "sources" => Ok(&*CONTENT_SOURCES),
        "users" => Ok(&*ADMIN_USERS),
        "posts" => Ok(&*POSTS),
        "pages" => Ok(&*PAGES),
        "media" => Ok(&*MEDIA),
        other => Err(QueryError::UnknownResource(other.to_string())),
    }
}

/// Table backing each resource.
pub fn resource_table(name: &str) -> Result<&'static str, QueryError> {
    match name {
        "content" => Ok("content_items"),
        "sources" => Ok("content_sources"),
        "users" => Ok("admin_users"),
        "posts" => Ok("posts"),
        "pages" => Ok("pages"),
        "media" => Ok("media"),
        other => Err(QueryError::UnknownResource(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names_exist_in_field_maps() {
        for name in ["content", "sources", "users", "posts", "pages", "media"] {
            let cfg = resource_config(name).unwrap();
            for sort in &cfg.default_sort {
                assert!(cfg.sortable_fields.contains_key(&sort.field), "{}: {}", name, sort.field);
            }
            for field in &cfg.default_search_fields {
                assert!(cfg.searchable_fields.contains_key(field), "{}: {}", name, field);
            }
        }
    }

    #[test]
    fn test_unknown_resource() {
        assert!(resource_config("secrets").is_err());
        assert!(resource_table("secrets").is_err());
    }
}
