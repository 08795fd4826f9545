use serde_json::Value;

use super::builder::PreparedQuery;
use super::types::{Column, FilterOp, FilterParam, QueryConfig};

pub struct QueryWhere;

impl QueryWhere {
    /// Appends one conjunctive condition per filter. Fields the config does
    /// not expose are skipped even if a caller built the params by hand.
    pub fn apply_filters(query: &mut PreparedQuery, filters: &[FilterParam], config: &QueryConfig) {
        for filter in filters {
            let Some(column) = config.filterable_fields.get(&filter.field) else {
                tracing::debug!(field = %filter.field, "skipping filter on non-filterable field");
                continue;
            };
            if let Some(condition) = Self::filter_condition(query, column, filter) {
                query.push_condition(condition);
            }
        }
    }

    /// Appends `(c1 ILIKE $a OR c2 ILIKE $b ...)` with one bind per column.
    pub fn apply_search(query: &mut PreparedQuery, search: &str, fields: &[String], config: &QueryConfig) {
        let term = search.trim();
        if term.is_empty() {
            return;
        }
        let pattern = format!("%{}%", term);
        let parts: Vec<String> = fields
            .iter()
            .filter_map(|field| config.searchable_fields.get(field))
            .map(|column| format!("{} ILIKE {}", column.as_text(), query.bind(Value::String(pattern.clone()))))
            .collect();
        if !parts.is_empty() {
            query.push_condition(format!("({})", parts.join(" OR ")));
        }
    }

    fn filter_condition(query: &mut PreparedQuery, column: &Column, filter: &FilterParam) -> Option<String> {
        let quoted = column.quoted();
        let cast = column.kind.cast();
        let first = filter.values.first();

        match filter.operator {
            FilterOp::Eq | FilterOp::Ne | FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                // single-valued: only the first value is honored
                let value = first?;
                let sql_op = match filter.operator {
                    FilterOp::Eq => "=",
                    FilterOp::Ne => "<>",
                    FilterOp::Gt => ">",
                    FilterOp::Gte => ">=",
                    FilterOp::Lt => "<",
                    _ => "<=",
                };
                let param = query.bind(Value::String(value.clone()));
                Some(format!("{} {} {}{}", quoted, sql_op, param, cast))
            }
            FilterOp::Contains | FilterOp::Starts | FilterOp::Ends => {
                let value = first?;
                let pattern = match filter.operator {
                    FilterOp::Contains => format!("%{}%", value),
                    FilterOp::Starts => format!("{}%", value),
                    _ => format!("%{}", value),
                };
                let param = query.bind(Value::String(pattern));
                Some(format!("{} ILIKE {}", column.as_text(), param))
            }
            FilterOp::In | FilterOp::Nin => {
                if filter.values.is_empty() {
                    return None;
                }
                let params: Vec<String> = filter
                    .values
                    .iter()
                    .map(|v| format!("{}{}", query.bind(Value::String(v.clone())), cast))
                    .collect();
                let keyword = if filter.operator == FilterOp::In { "IN" } else { "NOT IN" };
                Some(format!("{} {} ({})", quoted, keyword, params.join(", ")))
            }
            FilterOp::Null => Some(format!("{} IS NULL", quoted)),
            FilterOp::NotNull => Some(format!("{} IS NOT NULL", quoted)),
        }
    }
}
