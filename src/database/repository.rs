use serde_json::Value;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::executor;
use crate::database::manager::DatabaseError;
use crate::query::{apply_query, Column, PreparedQuery, QueryConfig, QueryMeta, QueryParams};

/// Read/delete helpers over one table, optionally scoped to a tenant.
/// Rows outside the scope behave exactly like missing rows.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    tenant_id: Option<String>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            tenant_id: None,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn scoped(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn base_query(&self) -> Result<PreparedQuery, DatabaseError> {
        let query = PreparedQuery::new(self.table_name)?;
        Ok(match &self.tenant_id {
            Some(tenant) => query.where_eq("tenant_id", tenant.as_str()),
            None => query,
        })
    }

    /// Client-driven list: filters, search, sort and one page plus meta.
    pub async fn list(&self, params: &QueryParams, config: &QueryConfig) -> Result<(Vec<T>, QueryMeta), DatabaseError> {
        let query = apply_query(self.base_query()?, params, config);
        executor::fetch_with_pagination(&self.pool, &query, &params.pagination).await
    }

    pub async fn find_by_public_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        let query = self.by_public_id(id)?;
        executor::fetch_optional(&self.pool, &query.to_sql(Some(1), None))
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record not found", self.table_name)))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<T, DatabaseError> {
        let query = self.base_query()?.where_eq("id", id);
        executor::fetch_optional(&self.pool, &query.to_sql(Some(1), None))
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record not found", self.table_name)))
    }

    pub async fn find_one_where(&self, column: &str, value: impl Into<Value>) -> Result<Option<T>, DatabaseError> {
        let query = self.base_query()?.where_eq(column, value);
        executor::fetch_optional(&self.pool, &query.to_sql(Some(1), None)).await
    }

    pub async fn delete_by_public_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        let query = self.by_public_id(id)?;
        self.delete_matching(&query).await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError> {
        let query = self.base_query()?.where_eq("id", id);
        self.delete_matching(&query).await
    }

    fn by_public_id(&self, id: Uuid) -> Result<PreparedQuery, DatabaseError> {
        let mut query = self.base_query()?;
        let column = Column::uuid("public_id");
        let param = query.bind(Value::String(id.to_string()));
        query.push_condition(format!("{} = {}{}", column.quoted(), param, column.kind.cast()));
        Ok(query)
    }

    async fn delete_matching(&self, query: &PreparedQuery) -> Result<(), DatabaseError> {
        let sql = crate::query::SqlResult {
            query: format!("DELETE FROM \"{}\" {}", self.table_name, query.to_where_sql()),
            params: query.params().to_vec(),
        };
        match executor::execute(&self.pool, &sql).await? {
            0 => Err(DatabaseError::NotFound(format!("{} record not found", self.table_name))),
            _ => Ok(()),
        }
    }
}
