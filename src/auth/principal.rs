use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::claims::JwtClaims;
use crate::error::ApiError;

/// Verified identity of an admin request. Built once per request from
/// normalized claims and handed to handlers as a typed extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPrincipal {
    pub user_id: String,
    pub email: String,
    pub tenant_id: String,
    pub role: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub issuer: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AdminPrincipal {
    pub fn from_claims(claims: JwtClaims, default_tenant_id: &str) -> Self {
        let tenant_id = match claims.tenant_id.trim() {
            "" => default_tenant_id.to_string(),
            t => t.to_string(),
        };
        let expires_at = claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single());

        Self {
            user_id: claims.user_id,
            email: claims.email,
            tenant_id,
            role: claims.role,
            roles: claims.roles,
            permissions: claims.permissions,
            issuer: claims.iss,
            expires_at,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        let target = role.trim();
        if target.is_empty() {
            return false;
        }
        self.role.eq_ignore_ascii_case(target) || self.roles.iter().any(|r| r.eq_ignore_ascii_case(target))
    }

    /// Admins hold every permission. Otherwise a grant matches exactly, as
    /// `*:*`, or as `resource:*` for a `resource:action` request.
    pub fn has_permission(&self, permission: &str) -> bool {
        let required = permission.trim().to_lowercase();
        if required.is_empty() {
            return false;
        }
        if self.has_role("admin") {
            return true;
        }

        let required_resource = match required.split(':').collect::<Vec<_>>().as_slice() {
            [resource, _action] => Some(resource.to_string()),
            _ => None,
        };

        self.permissions.iter().any(|granted| {
            let granted = granted.trim().to_lowercase();
            if granted == required || granted == "*:*" {
                return true;
            }
            match (granted.split(':').collect::<Vec<_>>().as_slice(), &required_resource) {
                ([resource, "*"], Some(required_resource)) => resource == required_resource,
                _ => false,
            }
        })
    }

    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient role"))
        }
    }

    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("Missing permission '{}'", permission)))
        }
    }

    /// Tenant scope for storage queries.
    pub fn tenant(&self) -> Result<&str, ApiError> {
        match self.tenant_id.trim() {
            "" => Err(ApiError::TenantRequired),
            tenant => Ok(tenant),
        }
    }
}
