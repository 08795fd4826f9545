use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{AdminRole, AdminUser};
use crate::database::{DatabaseError, Repository};
use crate::query::{QueryConfig, QueryMeta, QueryParams};

/// Checked input for a new admin account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: String,
    pub role: AdminRole,
    pub password_hash: String,
    pub permissions: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AdminUserChanges {
    pub email: Option<String>,
    pub role: Option<AdminRole>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Account state the admin middleware checks on every request.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// `Some(is_active)` for a known account, `None` when no row matches.
    async fn account_status(&self, public_id: Uuid) -> Result<Option<bool>, DatabaseError>;
}

#[derive(Clone)]
pub struct AdminUserService {
    pool: PgPool,
}

impl AdminUserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self, tenant_id: &str) -> Repository<AdminUser> {
        Repository::new("admin_users", self.pool.clone()).scoped(tenant_id)
    }

    /// Login lookup. Emails are stored lower-cased and unique across tenants.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, DatabaseError> {
        Repository::<AdminUser>::new("admin_users", self.pool.clone())
            .find_one_where("email", email.trim().to_lowercase())
            .await
    }

    pub async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DatabaseError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT public_id FROM admin_users WHERE email = $1 AND ($2::uuid IS NULL OR public_id <> $2) LIMIT 1",
        )
        .bind(email.trim().to_lowercase())
        .bind(except)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn list(
        &self,
        tenant_id: &str,
        params: &QueryParams,
        config: &QueryConfig,
    ) -> Result<(Vec<AdminUser>, QueryMeta), DatabaseError> {
        self.repository(tenant_id).list(params, config).await
    }

    pub async fn get(&self, tenant_id: &str, id: Uuid) -> Result<AdminUser, DatabaseError> {
        self.repository(tenant_id).find_by_public_id(id).await.map_err(not_found)
    }

    pub async fn create(&self, tenant_id: &str, user: &NewAdminUser) -> Result<AdminUser, DatabaseError> {
        let created = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (public_id, tenant_id, email, role, password_hash, permissions, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(&user.permissions)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique_violation(e, "Email already exists"))?;

        tracing::info!(id = %created.public_id, tenant_id, "admin user created");
        Ok(created)
    }

    pub async fn update(&self, tenant_id: &str, id: Uuid, changes: &AdminUserChanges) -> Result<AdminUser, DatabaseError> {
        sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users SET
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                permissions = COALESCE($5, permissions),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE public_id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&changes.email)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(&changes.permissions)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique_violation(e, "Email already exists"))?
        .ok_or_else(|| not_found(DatabaseError::NotFound(String::new())))
    }

    pub async fn reset_password(&self, tenant_id: &str, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE admin_users SET password_hash = $3, updated_at = NOW() WHERE public_id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        match result.rows_affected() {
            0 => Err(not_found(DatabaseError::NotFound(String::new()))),
            _ => Ok(()),
        }
    }

    pub async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<(), DatabaseError> {
        self.repository(tenant_id).delete_by_public_id(id).await.map_err(not_found)
    }
}

#[async_trait]
impl AccountDirectory for AdminUserService {
    async fn account_status(&self, public_id: Uuid) -> Result<Option<bool>, DatabaseError> {
        let active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM admin_users WHERE public_id = $1")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(active)
    }
}

fn not_found(err: DatabaseError) -> DatabaseError {
    match err {
        DatabaseError::NotFound(_) => DatabaseError::NotFound("Admin user not found".to_string()),
        other => other,
    }
}
