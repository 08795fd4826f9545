use axum::Extension;

use crate::auth::AdminPrincipal;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /admin/me - the caller's resolved principal
pub async fn me_get(Extension(principal): Extension<AdminPrincipal>) -> ApiResult<AdminPrincipal> {
    Ok(ApiResponse::success(principal))
}
