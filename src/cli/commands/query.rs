use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::query::resources::{resource_config, resource_table};
use crate::query::{apply_query, PreparedQuery, QueryParser, SqlResult};

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[arg(help = "Resource name: content, sources, users, posts, pages or media")]
    pub resource: String,

    #[arg(default_value = "", help = "Raw query string, e.g. 'status=in:ready,pending&sort=created_at&order=desc'")]
    pub query: String,
}

/// Count and page SQL for a query string, exactly as a list endpoint
/// would run it (minus tenant scoping).
pub fn preview(resource: &str, raw_query: &str) -> anyhow::Result<(SqlResult, SqlResult)> {
    let config = resource_config(resource)?;
    let table = resource_table(resource)?;
    let raw_query = raw_query.trim_start_matches('?');

    let params = QueryParser::parse(raw_query, config)?;
    let query = apply_query(PreparedQuery::new(table)?, &params, config);
    let page = &params.pagination;
    Ok((query.to_count_sql(), query.to_sql(Some(page.limit), Some(page.offset))))
}

pub fn handle(args: QueryArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (count, select) = preview(&args.resource, &args.query)?;

    match output_format {
        OutputFormat::Text => {
            println!("-- count");
            println!("{}", count.query);
            println!("-- select");
            println!("{}", select.query);
            for (idx, param) in select.params.iter().enumerate() {
                println!("${} = {}", idx + 1, param);
            }
            Ok(())
        }
        OutputFormat::Json => output_success(
            &output_format,
            "Query parsed",
            Some(json!({
                "count": { "sql": count.query, "params": count.params },
                "select": { "sql": select.query, "params": select.params },
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_binds_filter_values() {
        let (count, select) = preview("sources", "?is_active=eq:true&limit=5").unwrap();
        assert!(count.query.starts_with("SELECT COUNT(*)"));
        assert!(select.query.contains("LIMIT 5"));
        assert!(select.params.iter().any(|p| p == "true"));
    }

    #[test]
    fn test_preview_rejects_unknown_resource() {
        assert!(preview("widgets", "").is_err());
        assert!(preview("posts", "limit=0").is_err());
    }
}
