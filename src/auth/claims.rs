use serde::{Deserialize, Serialize};

const ROLE_PRIORITY: [&str; 4] = ["admin", "manager", "agent", "user"];

/// `aud` may be a single string or a list on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

/// Token payload accepted on admin routes. Covers both tokens minted by this
/// service at login and tokens from the upstream IAM issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl JwtClaims {
    /// Canonical form: lower-case identity fields, deduplicated roles that
    /// always contain `role`, deduplicated lower-case permissions.
    pub fn normalize(&mut self) {
        if self.user_id.is_empty() {
            self.user_id = self.sub.trim().to_string();
        }
        self.email = self.email.trim().to_lowercase();
        self.role = self.role.trim().to_lowercase();

        let mut roles = normalize_list(&self.roles);
        if !self.role.is_empty() && !roles.contains(&self.role) {
            roles.push(self.role.clone());
        }
        if self.role.is_empty() && !roles.is_empty() {
            self.role = primary_role(&roles);
        }
        self.roles = roles;
        self.permissions = normalize_list(&self.permissions);
    }

    pub fn has_required_fields(&self) -> bool {
        !self.sub.trim().is_empty() && !self.email.is_empty() && !self.role.is_empty()
    }
}

/// Picks the most privileged known role, else the first listed one.
pub fn primary_role(roles: &[String]) -> String {
    ROLE_PRIORITY
        .iter()
        .find(|candidate| roles.iter().any(|role| role == *candidate))
        .map(|role| role.to_string())
        .or_else(|| roles.first().cloned())
        .unwrap_or_else(|| "user".to_string())
}

/// Trims, lower-cases and dedupes while keeping first-seen order.
pub fn normalize_list(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let candidate = value.trim().to_lowercase();
        if candidate.is_empty() || out.contains(&candidate) {
            continue;
        }
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_backfills_and_lowercases() {
        let mut claims = JwtClaims {
            sub: "u-1".into(),
            email: "  Ops@Example.COM ".into(),
            role: " Manager ".into(),
            roles: strings(&["Agent", "agent", " "]),
            permissions: strings(&["Content:Read", "content:read", ""]),
            ..Default::default()
        };
        claims.normalize();

        assert_eq!(claims.user_id, "u-1");
        assert_eq!(claims.email, "ops@example.com");
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.roles, strings(&["agent", "manager"]));
        assert_eq!(claims.permissions, strings(&["content:read"]));
        assert!(claims.has_required_fields());
    }

    #[test]
    fn test_role_derived_from_roles_by_priority() {
        let mut claims = JwtClaims { roles: strings(&["user", "Admin"]), ..Default::default() };
        claims.normalize();
        assert_eq!(claims.role, "admin");

        let mut claims = JwtClaims { roles: strings(&["editor", "viewer"]), ..Default::default() };
        claims.normalize();
        assert_eq!(claims.role, "editor");
    }

    #[test]
    fn test_roleless_claims_fail_required_check() {
        let mut claims = JwtClaims { sub: "u-1".into(), email: "a@b.c".into(), ..Default::default() };
        claims.normalize();
        assert!(claims.role.is_empty());
        assert!(!claims.has_required_fields());
    }

    #[test]
    fn test_primary_role_fallbacks() {
        assert_eq!(primary_role(&[]), "user");
        assert_eq!(primary_role(&strings(&["agent", "manager"])), "manager");
    }

    #[test]
    fn test_audience_accepts_string_or_list() {
        let claims: JwtClaims = serde_json::from_str(r#"{"email":"a@b.c","aud":"console"}"#).unwrap();
        assert_eq!(claims.aud, Some(Audience::Single("console".into())));

        let claims: JwtClaims = serde_json::from_str(r#"{"email":"a@b.c","aud":["a","b"]}"#).unwrap();
        assert_eq!(claims.aud, Some(Audience::Many(strings(&["a", "b"]))));
    }
}
