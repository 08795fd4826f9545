// handlers/admin/users.rs - /admin/users (admin role, tenant scoped)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    Extension, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{hash_password, AdminPrincipal};
use crate::database::models::{admin_user::is_valid_email, AdminRole, AdminUser};
use crate::error::ApiError;
use crate::handlers::{json_body, list_params, non_blank, parse_public_id};
use crate::middleware::{ApiResponse, ApiResult, PageResult, Paginated};
use crate::query::resources::ADMIN_USERS;
use crate::services::admin_user_service::{AdminUserChanges, NewAdminUser};

#[derive(Debug, Default, Deserialize)]
pub struct AdminUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub password: String,
}

fn parse_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request_code("Invalid email format", "INVALID_EMAIL_FORMAT"));
    }
    Ok(email)
}

fn parse_role(raw: &str) -> Result<AdminRole, ApiError> {
    raw.parse().map_err(|e: String| ApiError::bad_request_code(e, "INVALID_ROLE"))
}

fn clean_permissions(permissions: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(permissions.len());
    for permission in permissions {
        let permission = permission.trim().to_lowercase();
        if !permission.is_empty() && !cleaned.contains(&permission) {
            cleaned.push(permission);
        }
    }
    cleaned
}

impl AdminUserRequest {
    /// Checks a create request. Hashing happens after validation.
    fn into_new_user(self) -> Result<(NewAdminUser, String), ApiError> {
        let email = non_blank(self.email.as_deref())
            .ok_or_else(|| ApiError::bad_request_code("Email is required", "EMAIL_REQUIRED"))?;
        let email = parse_email(&email)?;
        let role = non_blank(self.role.as_deref())
            .ok_or_else(|| ApiError::bad_request_code("Role is required", "ROLE_REQUIRED"))?;
        let role = parse_role(&role)?;
        let password = self
            .password
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request_code("Password is required", "PASSWORD_REQUIRED"))?;

        let user = NewAdminUser {
            email,
            role,
            password_hash: String::new(),
            permissions: clean_permissions(self.permissions.unwrap_or_default()),
            is_active: self.is_active.unwrap_or(true),
        };
        Ok((user, password))
    }

    /// Blank fields are left untouched.
    fn into_changes(self) -> Result<AdminUserChanges, ApiError> {
        Ok(AdminUserChanges {
            email: non_blank(self.email.as_deref()).map(|e| parse_email(&e)).transpose()?,
            role: non_blank(self.role.as_deref()).map(|r| parse_role(&r)).transpose()?,
            permissions: self.permissions.map(clean_permissions),
            is_active: self.is_active,
        })
    }
}

fn email_exists() -> ApiError {
    ApiError::conflict("Email already exists", "EMAIL_EXISTS")
}

/// GET /admin/users
pub async fn users_list(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    uri: Uri,
) -> PageResult<AdminUser> {
    principal.require_role("admin")?;
    let params = list_params(&uri, &ADMIN_USERS)?;
    let (users, meta) = state.admin_users.list(principal.tenant()?, &params, &ADMIN_USERS).await?;
    Ok(Paginated::new(users, meta, uri.path(), uri.query()))
}

/// GET /admin/users/:id
pub async fn user_get(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<AdminUser> {
    principal.require_role("admin")?;
    let id = parse_public_id(&id, "user")?;
    Ok(ApiResponse::success(state.admin_users.get(principal.tenant()?, id).await?))
}

/// POST /admin/users
pub async fn user_create(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    payload: Result<Json<AdminUserRequest>, JsonRejection>,
) -> ApiResult<AdminUser> {
    principal.require_role("admin")?;
    let tenant_id = principal.tenant()?;
    let (mut user, password) = json_body(payload, "INVALID_REQUEST")?.into_new_user()?;

    if state.admin_users.email_taken(&user.email, None).await? {
        return Err(email_exists());
    }
    user.password_hash = hash_password(&password)?;

    Ok(ApiResponse::created(state.admin_users.create(tenant_id, &user).await?))
}

/// PUT /admin/users/:id
pub async fn user_update(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    payload: Result<Json<AdminUserRequest>, JsonRejection>,
) -> ApiResult<AdminUser> {
    principal.require_role("admin")?;
    let tenant_id = principal.tenant()?;
    let id = parse_public_id(&id, "user")?;
    let changes = json_body(payload, "INVALID_REQUEST")?.into_changes()?;

    if let Some(email) = &changes.email {
        if state.admin_users.email_taken(email, Some(id)).await? {
            return Err(email_exists());
        }
    }

    Ok(ApiResponse::success(state.admin_users.update(tenant_id, id, &changes).await?))
}

/// DELETE /admin/users/:id - refuses to delete the caller's own account
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    principal.require_role("admin")?;
    let id = parse_public_id(&id, "user")?;
    if principal.user_id.eq_ignore_ascii_case(&id.to_string()) {
        return Err(ApiError::bad_request_code("Cannot delete your own account", "CANNOT_DELETE_SELF"));
    }

    state.admin_users.delete(principal.tenant()?, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /admin/users/:id/reset-password
pub async fn user_reset_password(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    payload: Result<Json<PasswordResetRequest>, JsonRejection>,
) -> ApiResult<()> {
    principal.require_role("admin")?;
    let id = parse_public_id(&id, "user")?;
    let request = json_body(payload, "INVALID_REQUEST")?;
    if request.password.trim().is_empty() {
        return Err(ApiError::bad_request_code("Password is required", "PASSWORD_REQUIRED"));
    }

    let hash = hash_password(&request.password)?;
    state.admin_users.reset_password(principal.tenant()?, id, &hash).await?;
    Ok(ApiResponse::<()>::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, role: &str, password: &str) -> AdminUserRequest {
        AdminUserRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            role: Some(role.into()),
            permissions: Some(vec![" Content:Read ".into(), "content:read".into(), "".into()]),
            is_active: None,
        }
    }

    #[test]
    fn test_create_validation_order() {
        let code = |r: AdminUserRequest| r.into_new_user().unwrap_err().error_code();
        assert_eq!(code(request("", "admin", "pw")), "EMAIL_REQUIRED");
        assert_eq!(code(request("nope", "admin", "pw")), "INVALID_EMAIL_FORMAT");
        assert_eq!(code(request("a@example.com", " ", "pw")), "ROLE_REQUIRED");
        assert_eq!(code(request("a@example.com", "owner", "pw")), "INVALID_ROLE");
        assert_eq!(code(request("a@example.com", "agent", "")), "PASSWORD_REQUIRED");
    }

    #[test]
    fn test_create_normalizes_fields() {
        let (user, password) = request(" A@Example.com ", "Manager", "pw").into_new_user().unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.role, AdminRole::Manager);
        assert_eq!(user.permissions, vec!["content:read"]);
        assert!(user.is_active);
        assert_eq!(password, "pw");
    }

    #[test]
    fn test_update_ignores_blank_fields() {
        let changes = AdminUserRequest { email: Some("  ".into()), is_active: Some(false), ..Default::default() }
            .into_changes()
            .unwrap();
        assert!(changes.email.is_none());
        assert!(changes.role.is_none());
        assert_eq!(changes.is_active, Some(false));
    }
}
