use serde_json::Value;

use super::error::QueryError;
use super::query_order::QueryOrder;
use super::query_where::QueryWhere;
use super::types::{Column, QueryConfig, QueryParams, SqlResult};

/// A filtered, ordered SELECT over one table. Base conditions (tenant scope,
/// fixed type filters) are added by the caller; `apply_query` then layers
/// client filters, search and sort on top.
///
/// Count and page statements are rendered independently from the same state,
/// so limit/offset can never leak into the count.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    table_name: String,
    select_columns: Vec<String>,
    conditions: Vec<String>,
    params: Vec<Value>,
    order: Vec<String>,
}

impl PreparedQuery {
    pub fn new(table_name: impl Into<String>) -> Result<Self, QueryError> {
        let table_name = table_name.into();
        validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            conditions: vec![],
            params: vec![],
            order: vec![],
        })
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// `"column" = $n` on a plain column of the base table.
    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        let param = self.bind(value.into());
        let condition = format!("{} = {}", Column::text(column).quoted(), param);
        self.push_condition(condition);
        self
    }

    /// Registers a bind value and returns its placeholder.
    pub fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn push_condition(&mut self, condition: String) {
        self.conditions.push(condition);
    }

    pub fn push_order(&mut self, term: String) {
        self.order.push(term);
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn to_where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let query = [
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name),
            self.to_where_sql(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params: self.params.clone() }
    }

    pub fn to_sql(&self, limit: Option<i64>, offset: Option<i64>) -> SqlResult {
        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            self.to_where_sql(),
            QueryOrder::generate(&self.order),
            build_limit_clause(limit, offset),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params: self.params.clone() }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() {
            "*".to_string()
        } else {
            self.select_columns.join(", ")
        }
    }
}

/// Layers client filters, then search, then sort onto a base query. Pure.
pub fn apply_query(mut query: PreparedQuery, params: &QueryParams, config: &QueryConfig) -> PreparedQuery {
    QueryWhere::apply_filters(&mut query, &params.filters, config);
    QueryWhere::apply_search(&mut query, &params.search, &params.search_fields, config);
    QueryOrder::apply(&mut query, &params.sort, config);
    query
}

fn validate_table_name(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

fn build_limit_clause(limit: Option<i64>, offset: Option<i64>) -> String {
    match (limit, offset) {
        (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
        (Some(l), None) => format!("LIMIT {}", l),
        (None, Some(o)) => format!("OFFSET {}", o),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::QueryParser;
    use crate::query::types::{Column, FilterOp, FilterParam, SortParam};
    use serde_json::json;

    fn config() -> QueryConfig {
        QueryConfig::new()
            .sortable("published_at", Column::timestamp("content_items.published_at"))
            .sortable("title", Column::text("content_items.title"))
            .filterable("status", Column::text("content_items.status"))
            .filterable("published_at", Column::timestamp("content_items.published_at"))
            .filterable("title", Column::text("content_items.title"))
            .filterable("is_active", Column::boolean("is_active"))
            .searchable("title", Column::text("content_items.title"))
            .searchable("author", Column::text("content_items.author"))
            .default_sort(SortParam::desc("published_at"))
    }

    fn base() -> PreparedQuery {
        PreparedQuery::new("content_items").unwrap().where_eq("tenant_id", "acme")
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(PreparedQuery::new("content_items; DROP").is_err());
        assert!(PreparedQuery::new("1items").is_err());
        assert!(PreparedQuery::new("").is_err());
    }

    #[test]
    fn test_filters_then_search_then_sort() {
        let cfg = config();
        let params = QueryParser::parse(
            "status=in:READY,PENDING&published_at=gte:2024-01-01&title=starts:Rust&search=async&sort=title&order=desc",
            &cfg,
        )
        .unwrap();
        let query = apply_query(base(), &params, &cfg);
        let sql = query.to_sql(Some(20), Some(0));

        assert_eq!(
            sql.query,
            "SELECT * FROM \"content_items\" WHERE \"tenant_id\" = $1 \
             AND \"content_items\".\"status\" IN ($2, $3) \
             AND \"content_items\".\"published_at\" >= $4::timestamptz \
             AND \"content_items\".\"title\" ILIKE $5 \
             AND (\"content_items\".\"author\" ILIKE $6 OR \"content_items\".\"title\" ILIKE $7) \
             ORDER BY \"content_items\".\"title\" DESC LIMIT 20 OFFSET 0"
        );
        assert_eq!(
            sql.params,
            vec![
                json!("acme"),
                json!("READY"),
                json!("PENDING"),
                json!("2024-01-01"),
                json!("Rust%"),
                json!("%async%"),
                json!("%async%"),
            ]
        );
    }

    #[test]
    fn test_count_sql_ignores_order_and_paging() {
        let cfg = config();
        let params = QueryParser::parse("status=ne:FAILED&page=4&limit=5", &cfg).unwrap();
        let query = apply_query(base(), &params, &cfg);

        let count = query.to_count_sql();
        assert_eq!(
            count.query,
            "SELECT COUNT(*) AS count FROM \"content_items\" WHERE \"tenant_id\" = $1 AND \"content_items\".\"status\" <> $2"
        );
        assert_eq!(count.params, vec![json!("acme"), json!("FAILED")]);

        let page = query.to_sql(Some(5), Some(15));
        assert!(page.query.ends_with("ORDER BY \"content_items\".\"published_at\" DESC LIMIT 5 OFFSET 15"));
        assert_eq!(page.params, count.params);
    }

    #[test]
    fn test_nullity_and_single_value_semantics() {
        let cfg = config();
        let params = QueryParams {
            filters: vec![
                FilterParam { field: "published_at".into(), operator: FilterOp::Null, values: vec![] },
                FilterParam {
                    field: "status".into(),
                    operator: FilterOp::Eq,
                    values: vec!["READY".into(), "FAILED".into()],
                },
                FilterParam { field: "is_active".into(), operator: FilterOp::Eq, values: vec!["true".into()] },
            ],
            ..Default::default()
        };
        let query = apply_query(PreparedQuery::new("content_items").unwrap(), &params, &cfg);
        assert_eq!(
            query.conditions(),
            &[
                "\"content_items\".\"published_at\" IS NULL".to_string(),
                "\"content_items\".\"status\" = $1".to_string(),
                "\"is_active\" = $2::boolean".to_string(),
            ]
        );
        assert_eq!(query.params(), &[json!("READY"), json!("true")]);
    }

    #[test]
    fn test_builder_skips_unconfigured_fields() {
        let cfg = config();
        let params = QueryParams {
            filters: vec![FilterParam { field: "password_hash".into(), operator: FilterOp::Eq, values: vec!["x".into()] }],
            sort: vec![SortParam::asc("password_hash")],
            search: "x".into(),
            search_fields: vec!["password_hash".into()],
            ..Default::default()
        };
        let query = apply_query(PreparedQuery::new("admin_users").unwrap(), &params, &cfg);
        assert!(query.conditions().is_empty());
        assert_eq!(query.to_sql(None, None).query, "SELECT * FROM \"admin_users\"");
    }

    #[test]
    fn test_empty_in_list_produces_no_condition() {
        let cfg = config();
        let params = QueryParams {
            filters: vec![FilterParam { field: "status".into(), operator: FilterOp::Nin, values: vec![] }],
            ..Default::default()
        };
        let query = apply_query(PreparedQuery::new("content_items").unwrap(), &params, &cfg);
        assert!(query.conditions().is_empty());
    }
}
