use super::builder::PreparedQuery;
use super::types::{QueryConfig, SortParam};

pub struct QueryOrder;

impl QueryOrder {
    pub fn apply(query: &mut PreparedQuery, sort: &[SortParam], config: &QueryConfig) {
        for param in sort {
            match config.sortable_fields.get(&param.field) {
                Some(column) => query.push_order(format!("{} {}", column.quoted(), param.direction.to_sql())),
                None => tracing::debug!(field = %param.field, "skipping sort on non-sortable field"),
            }
        }
    }

    pub fn generate(terms: &[String]) -> String {
        if terms.is_empty() {
            return String::new();
        }
        format!("ORDER BY {}", terms.join(", "))
    }
}
