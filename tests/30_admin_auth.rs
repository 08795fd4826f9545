mod common;

use axum::http::StatusCode;
use cms_api::auth::{issue_token, JwtSettings};
use common::{admin_token, admin_token_for, app, get, get_with_bearer, jwt_settings, send, DISABLED_USER_ID};

#[tokio::test]
async fn test_missing_bearer_is_auth_required() -> anyhow::Result<()> {
    let res = send(app()?, get("/admin/me")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "AUTH_REQUIRED");
    Ok(())
}

#[tokio::test]
async fn test_garbage_token_is_invalid() -> anyhow::Result<()> {
    let res = send(app()?, get_with_bearer("/admin/me", "not.a.jwt")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn test_expired_token_has_its_own_code() -> anyhow::Result<()> {
    let settings = JwtSettings { expiry_hours: -1, ..jwt_settings() };
    let token = issue_token(&settings, "u-1", "a@example.com", "", "admin", &[])?;

    let res = send(app()?, get_with_bearer("/admin/me", &token)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "TOKEN_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn test_foreign_signature_is_rejected() -> anyhow::Result<()> {
    let settings = JwtSettings { secret: "someone-elses-secret".into(), ..jwt_settings() };
    let token = issue_token(&settings, "u-1", "a@example.com", "", "admin", &[])?;

    let res = send(app()?, get_with_bearer("/admin/me", &token)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "INVALID_SIGNATURE");
    Ok(())
}

#[tokio::test]
async fn test_me_returns_resolved_principal() -> anyhow::Result<()> {
    let token = admin_token("Manager", &["Content:Read", "content:read"])?;

    let res = send(app()?, get_with_bearer("/admin/me", &token)).await?;
    assert_eq!(res.status, StatusCode::OK);
    let principal = &res.body["data"];
    assert_eq!(principal["email"], "editor@example.com");
    assert_eq!(principal["tenant_id"], "tenant-a");
    assert_eq!(principal["role"], "manager");
    assert_eq!(principal["permissions"], serde_json::json!(["content:read"]));
    Ok(())
}

#[tokio::test]
async fn test_user_management_requires_admin_role() -> anyhow::Result<()> {
    let token = admin_token("user", &[])?;

    let res = send(app()?, get_with_bearer("/admin/users", &token)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn test_source_routes_check_permissions() -> anyhow::Result<()> {
    let token = admin_token("agent", &["content:read"])?;

    let res = send(app()?, get_with_bearer("/admin/sources", &token)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_unknown_account_is_unauthorized() -> anyhow::Result<()> {
    let token = admin_token_for("7d0c7a3e-0000-4000-8000-0000000000ff", "admin", &[])?;

    let res = send(app()?, get_with_bearer("/admin/me", &token)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "UNAUTHORIZED");
    assert_eq!(res.body["message"], "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn test_disabled_account_is_forbidden() -> anyhow::Result<()> {
    let token = admin_token_for(DISABLED_USER_ID, "admin", &[])?;

    let res = send(app()?, get_with_bearer("/admin/me", &token)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), "FORBIDDEN");
    Ok(())
}
