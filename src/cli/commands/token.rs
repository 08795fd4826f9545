use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{issue_token, JwtSettings};
use crate::cli::utils::{output_field, output_success};
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Admin email placed in the token")]
    pub email: String,

    #[arg(long, default_value = "admin", help = "Role: admin, manager, agent or user")]
    pub role: String,

    #[arg(long, help = "Tenant id (defaults to DEFAULT_TENANT_ID)")]
    pub tenant: Option<String>,

    #[arg(long, help = "Admin account public id; the server rejects ids with no active account (random UUID when omitted)")]
    pub user_id: Option<String>,

    #[arg(long = "permission", help = "Permission grant, repeatable (e.g. content:read)")]
    pub permissions: Vec<String>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let settings = JwtSettings::from_config(&config().security);
    let user_id = args.user_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let tenant = args.tenant.unwrap_or_default();

    let token = issue_token(&settings, &user_id, &args.email, &tenant, &args.role, &args.permissions)?;

    output_field(&output_format, "user_id", &user_id);
    output_field(&output_format, "expires_in_hours", &settings.expiry_hours.to_string());
    output_success(
        &output_format,
        &format!("Token issued: {}", token),
        Some(json!({ "token": token, "user_id": user_id, "issuer": settings.issuer })),
    )
}
