use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::QueryError;

pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only a case-insensitive `desc` flips the default ascending order.
    pub fn from_param(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParam {
    pub field: String,
    pub direction: SortDirection,
}

impl SortParam {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// Filter operators accepted in `key=op:value` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    Starts,
    Ends,
    Null,
    NotNull,
}

impl FilterOp {
    pub const ALL: [FilterOp; 13] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::In,
        FilterOp::Nin,
        FilterOp::Contains,
        FilterOp::Starts,
        FilterOp::Ends,
        FilterOp::Null,
        FilterOp::NotNull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::In => "in",
            FilterOp::Nin => "nin",
            FilterOp::Contains => "contains",
            FilterOp::Starts => "starts",
            FilterOp::Ends => "ends",
            FilterOp::Null => "null",
            FilterOp::NotNull => "notnull",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FilterOp::In | FilterOp::Nin)
    }

    pub fn is_nullity(&self) -> bool {
        matches!(self, FilterOp::Null | FilterOp::NotNull)
    }
}

impl FromStr for FilterOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        FilterOp::ALL
            .into_iter()
            .find(|op| op.as_str() == lowered)
            .ok_or_else(|| QueryError::UnsupportedOperator(s.to_string()))
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParam {
    pub field: String,
    pub operator: FilterOp,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_LIMIT, offset: 0 }
    }
}

impl PaginationParams {
    /// Applies the floors the executor relies on: limit falls back to the
    /// default, offset is never negative, and a missing page is derived.
    pub fn normalized(&self) -> Self {
        let limit = if self.limit <= 0 { DEFAULT_LIMIT } else { self.limit };
        let offset = self.offset.max(0);
        let page = if self.page <= 0 { (offset / limit).saturating_add(1) } else { self.page };
        Self { page, limit, offset }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub pagination: PaginationParams,
    pub sort: Vec<SortParam>,
    pub filters: Vec<FilterParam>,
    pub search: String,
    pub search_fields: Vec<String>,
}

/// Physical column type. Filter values arrive as text and are cast to this
/// type in SQL so typed columns compare natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
    Timestamp,
    Uuid,
}

impl ColumnKind {
    pub fn cast(&self) -> &'static str {
        match self {
            ColumnKind::Text => "",
            ColumnKind::Integer => "::bigint",
            ColumnKind::Boolean => "::boolean",
            ColumnKind::Timestamp => "::timestamptz",
            ColumnKind::Uuid => "::uuid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Timestamp)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Uuid)
    }

    /// Quoted identifier, `content_items.title` -> `"content_items"."title"`.
    pub fn quoted(&self) -> String {
        self.name
            .split('.')
            .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Expression usable on the left of ILIKE.
    pub fn as_text(&self) -> String {
        match self.kind {
            ColumnKind::Text => self.quoted(),
            _ => format!("{}::text", self.quoted()),
        }
    }
}

/// Per-resource query surface: which logical fields a client may sort,
/// filter and search on, and the physical columns they map to.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub default_sort: Vec<SortParam>,
    pub sortable_fields: BTreeMap<String, Column>,
    pub filterable_fields: BTreeMap<String, Column>,
    pub searchable_fields: BTreeMap<String, Column>,
    pub default_search_fields: Vec<String>,
    pub field_default_operators: BTreeMap<String, FilterOp>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            default_sort: vec![],
            sortable_fields: BTreeMap::new(),
            filterable_fields: BTreeMap::new(),
            searchable_fields: BTreeMap::new(),
            default_search_fields: vec![],
            field_default_operators: BTreeMap::new(),
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    pub fn sortable(mut self, field: &str, column: Column) -> Self {
        self.sortable_fields.insert(field.to_string(), column);
        self
    }

    pub fn filterable(mut self, field: &str, column: Column) -> Self {
        self.filterable_fields.insert(field.to_string(), column);
        self
    }

    pub fn searchable(mut self, field: &str, column: Column) -> Self {
        self.searchable_fields.insert(field.to_string(), column);
        self
    }

    pub fn default_sort(mut self, sort: SortParam) -> Self {
        self.default_sort.push(sort);
        self
    }

    pub fn default_search(mut self, field: &str) -> Self {
        self.default_search_fields.push(field.to_string());
        self
    }

    pub fn default_operator(mut self, field: &str, op: FilterOp) -> Self {
        self.field_default_operators.insert(field.to_string(), op);
        self
    }

    /// Max limit with the unset fallback applied.
    pub fn effective_max_limit(&self) -> i64 {
        if self.max_limit <= 0 { DEFAULT_MAX_LIMIT } else { self.max_limit }
    }

    /// Default page size: unset falls back to 20, then clamped into `[1, max]`.
    pub fn effective_default_limit(&self) -> i64 {
        let max = self.effective_max_limit();
        let default = if self.default_limit <= 0 { DEFAULT_LIMIT } else { self.default_limit };
        default.clamp(1, max)
    }

    pub fn default_operator_for(&self, field: &str) -> FilterOp {
        self.field_default_operators.get(field).copied().unwrap_or(FilterOp::Eq)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_op_from_str_is_case_insensitive() {
        assert_eq!("GTE".parse::<FilterOp>().unwrap(), FilterOp::Gte);
        assert_eq!(" notnull ".parse::<FilterOp>().unwrap(), FilterOp::NotNull);
        assert!("between".parse::<FilterOp>().is_err());
    }

    #[test]
    fn test_column_quoting_splits_table_prefix() {
        let column = Column::timestamp("content_items.published_at");
        assert_eq!(column.quoted(), "\"content_items\".\"published_at\"");
        assert_eq!(column.as_text(), "\"content_items\".\"published_at\"::text");
    }

    #[test]
    fn test_effective_limits() {
        let config = QueryConfig::new().limits(0, 0);
        assert_eq!(config.effective_max_limit(), 100);
        assert_eq!(config.effective_default_limit(), 20);

        let config = QueryConfig::new().limits(500, 50);
        assert_eq!(config.effective_default_limit(), 50);

        let config = QueryConfig::new().limits(0, 10);
        assert_eq!(config.effective_default_limit(), 10);
    }

    #[test]
    fn test_pagination_normalized_derives_page() {
        let p = PaginationParams { page: 0, limit: 0, offset: 45 }.normalized();
        assert_eq!(p, PaginationParams { page: 3, limit: 20, offset: 45 });

        let p = PaginationParams { page: 2, limit: 10, offset: -3 }.normalized();
        assert_eq!(p.offset, 0);
        assert_eq!(p.page, 2);
    }
}
