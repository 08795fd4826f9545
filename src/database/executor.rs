use serde_json::Value;
use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::query::{PaginationParams, PreparedQuery, QueryMeta, SqlResult};

/// Counts the filtered set, then fetches one bounded page of it.
///
/// The count runs on its own statement rendered without ORDER BY, LIMIT or
/// OFFSET, so the total always reflects the whole filtered set.
pub async fn fetch_with_pagination<T>(
    pool: &PgPool,
    query: &PreparedQuery,
    pagination: &PaginationParams,
) -> Result<(Vec<T>, QueryMeta), DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let pagination = pagination.normalized();

    let total = count(pool, &query.to_count_sql()).await?;
    let rows = fetch_all(pool, &query.to_sql(Some(pagination.limit), Some(pagination.offset))).await?;

    Ok((rows, QueryMeta::new(&pagination, total)))
}

pub async fn count(pool: &PgPool, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

pub async fn fetch_all<T>(pool: &PgPool, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(pool).await?)
}

pub async fn fetch_optional<T>(pool: &PgPool, sql: &SqlResult) -> Result<Option<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_optional(pool).await?)
}

pub async fn execute(pool: &PgPool, sql: &SqlResult) -> Result<u64, DatabaseError> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    Ok(q.execute(pool).await?.rows_affected())
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v),
    }
}
