use super::error::QueryError;
use super::filter_value::{sanitize_list, FilterValue};
use super::types::{FilterParam, PaginationParams, QueryConfig, QueryParams, SortDirection, SortParam};

/// Query keys that control paging, sorting and search. Never filters.
pub const RESERVED_KEYS: [&str; 7] = ["page", "limit", "offset", "sort", "order", "search", "search_fields"];

pub struct QueryParser;

impl QueryParser {
    /// Parses a raw (still percent-encoded) query string against a resource
    /// config. Any invalid parameter fails the whole request.
    pub fn parse(raw_query: &str, config: &QueryConfig) -> Result<QueryParams, QueryError> {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.as_bytes())
            .into_owned()
            .collect();
        Self::parse_pairs(&pairs, config)
    }

    pub fn parse_pairs(pairs: &[(String, String)], config: &QueryConfig) -> Result<QueryParams, QueryError> {
        let pagination = Self::parse_pagination(pairs, config)?;

        let mut sort = Self::parse_sort(pairs, config);
        if sort.is_empty() {
            sort = config.default_sort.clone();
        }

        let search = first_value(pairs, "search").unwrap_or_default().trim().to_string();
        let search_fields = Self::parse_search_fields(pairs, config);
        let filters = Self::parse_filters(pairs, config)?;

        Ok(QueryParams { pagination, sort, filters, search, search_fields })
    }

    fn parse_pagination(pairs: &[(String, String)], config: &QueryConfig) -> Result<PaginationParams, QueryError> {
        let max_limit = config.effective_max_limit();
        let mut pagination = PaginationParams {
            page: 1,
            limit: config.effective_default_limit(),
            offset: 0,
        };

        if let Some(raw) = present_value(pairs, "limit") {
            let limit: i64 = raw.parse().map_err(|_| QueryError::InvalidLimit)?;
            if limit <= 0 {
                return Err(QueryError::InvalidLimit);
            }
            pagination.limit = limit.min(max_limit);
        }

        if let Some(raw) = present_value(pairs, "page") {
            let page: i64 = raw.parse().map_err(|_| QueryError::InvalidPage)?;
            if page <= 0 {
                return Err(QueryError::InvalidPage);
            }
            pagination.page = page;
        }

        match present_value(pairs, "offset") {
            Some(raw) => {
                let offset: i64 = raw.parse().map_err(|_| QueryError::InvalidOffset)?;
                if offset < 0 {
                    return Err(QueryError::InvalidOffset);
                }
                pagination.offset = offset;
                pagination.page = (offset / pagination.limit).saturating_add(1);
            }
            None => {
                pagination.offset = (pagination.page - 1)
                    .checked_mul(pagination.limit)
                    .ok_or(QueryError::InvalidPage)?;
            }
        }

        Ok(pagination)
    }

    fn parse_sort(pairs: &[(String, String)], config: &QueryConfig) -> Vec<SortParam> {
        let fields = sanitize_list(first_value(pairs, "sort").unwrap_or_default());
        let orders = sanitize_list(first_value(pairs, "order").unwrap_or_default());

        let mut sort = Vec::with_capacity(fields.len());
        for (idx, field) in fields.into_iter().enumerate() {
            if !config.sortable_fields.contains_key(&field) {
                tracing::debug!(field = %field, "dropping unknown sort field");
                continue;
            }
            let direction = orders
                .get(idx)
                .map(|dir| SortDirection::from_param(dir))
                .unwrap_or(SortDirection::Asc);
            sort.push(SortParam { field, direction });
        }
        sort
    }

    fn parse_search_fields(pairs: &[(String, String)], config: &QueryConfig) -> Vec<String> {
        if let Some(raw) = present_value(pairs, "search_fields") {
            let requested = sanitize_list(raw);
            let valid: Vec<String> = requested
                .into_iter()
                .filter(|field| {
                    let known = config.searchable_fields.contains_key(field);
                    if !known {
                        tracing::debug!(field = %field, "dropping unknown search field");
                    }
                    known
                })
                .collect();
            if !valid.is_empty() {
                return valid;
            }
        }
        default_search_fields(config)
    }

    fn parse_filters(pairs: &[(String, String)], config: &QueryConfig) -> Result<Vec<FilterParam>, QueryError> {
        let mut filters = Vec::new();
        for (key, raw) in pairs {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if !config.filterable_fields.contains_key(key) {
                tracing::debug!(field = %key, "dropping unknown filter field");
                continue;
            }
            let value = FilterValue::parse(raw, config.default_operator_for(key))
                .map_err(|reason| QueryError::invalid_filter(key, reason))?;
            filters.push(FilterParam {
                field: key.clone(),
                operator: value.op,
                values: value.into_values(),
            });
        }
        Ok(filters)
    }
}

/// Configured default search fields that are actually searchable, else every
/// searchable field in name order.
pub fn default_search_fields(config: &QueryConfig) -> Vec<String> {
    let configured: Vec<String> = config
        .default_search_fields
        .iter()
        .filter(|field| config.searchable_fields.contains_key(*field))
        .cloned()
        .collect();
    if !configured.is_empty() {
        return configured;
    }
    // BTreeMap keys iterate sorted
    config.searchable_fields.keys().cloned().collect()
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn present_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    first_value(pairs, key).map(str::trim).filter(|v| !v.is_empty())
}
