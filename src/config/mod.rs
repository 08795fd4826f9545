use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

const FALLBACK_ALLOWED_ISSUERS: [&str; 2] = ["cms-service", "iam-authorization-service"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub query: QueryLimitsConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLimitsConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub feed_default_limit: i64,
    pub feed_max_limit: i64,
    pub news_default_slides: i64,
    pub news_max_slides: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub login_rate_limit_attempts: u32,
    pub login_rate_limit_window_secs: u64,
    pub enable_request_logging: bool,
    /// Key the login limiter on `X-Forwarded-For`/`X-Real-IP` instead of
    /// the socket peer. Only safe behind a proxy that overwrites them.
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_allowed_issuers: Vec<String>,
    pub jwt_allow_empty_issuer: bool,
    pub jwt_require_tenant_id: bool,
    pub default_tenant_id: String,
    pub jwt_expiry_hours: i64,
    #[serde(skip_serializing)]
    pub service_token: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::defaults(environment).with_env_overrides()
    }

    /// Built-in settings for one environment, ignoring the process env.
    pub fn defaults(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Query overrides
        if let Ok(v) = env::var("QUERY_DEFAULT_LIMIT") {
            self.query.default_limit = v.parse().unwrap_or(self.query.default_limit);
        }
        if let Ok(v) = env::var("QUERY_MAX_LIMIT") {
            self.query.max_limit = v.parse().unwrap_or(self.query.max_limit);
        }

        // Database overrides
        if let Some(v) = non_empty_var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(port) = non_empty_var("CMS_API_PORT")
            .or_else(|| non_empty_var("PORT"))
            .and_then(|v| v.parse().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("LOGIN_RATE_LIMIT_ATTEMPTS") {
            self.api.login_rate_limit_attempts = v.parse().unwrap_or(self.api.login_rate_limit_attempts);
        }
        if let Ok(v) = env::var("LOGIN_RATE_LIMIT_WINDOW_SECS") {
            self.api.login_rate_limit_window_secs = v.parse().unwrap_or(self.api.login_rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("TRUST_PROXY_HEADERS") {
            self.api.trust_proxy_headers = parse_flag(&v).unwrap_or(self.api.trust_proxy_headers);
        }

        // Security overrides
        if let Some(v) = non_empty_var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = non_empty_var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Some(v) = non_empty_var("JWT_AUDIENCE") {
            self.security.jwt_audience = v;
        }
        if let Some(v) = non_empty_var("JWT_ALLOWED_ISSUERS") {
            self.security.jwt_allowed_issuers = parse_allowed_issuers(&v);
        }
        if let Ok(v) = env::var("JWT_ALLOW_EMPTY_ISSUER") {
            self.security.jwt_allow_empty_issuer = parse_flag(&v).unwrap_or(self.security.jwt_allow_empty_issuer);
        }
        if let Ok(v) = env::var("JWT_REQUIRE_TENANT_ID") {
            self.security.jwt_require_tenant_id = parse_flag(&v).unwrap_or(false);
        }
        if let Some(v) = non_empty_var("DEFAULT_TENANT_ID") {
            self.security.default_tenant_id = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRATION_HOURS") {
            self.security.jwt_expiry_hours = v
                .parse()
                .ok()
                .filter(|hours: &i64| *hours > 0)
                .unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = non_empty_var("CMS_SERVICE_TOKEN") {
            self.security.service_token = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        // Aggregation overrides
        if let Some(v) = non_empty_var("AGGREGATION_BASE_URL") {
            let trimmed = v.trim_end_matches('/').to_string();
            self.aggregation.base_url = (!trimmed.is_empty()).then_some(trimmed);
        }
        if let Ok(v) = env::var("AGGREGATION_TIMEOUT_SECS") {
            self.aggregation.timeout_secs = v.parse().unwrap_or(self.aggregation.timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            query: QueryLimitsConfig::standard(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 8080,
                login_rate_limit_attempts: 5,
                login_rate_limit_window_secs: 15 * 60,
                enable_request_logging: true,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                ..SecurityConfig::standard()
            },
            aggregation: AggregationConfig { base_url: None, timeout_secs: 15 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            query: QueryLimitsConfig::standard(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 8080,
                login_rate_limit_attempts: 5,
                login_rate_limit_window_secs: 15 * 60,
                enable_request_logging: true,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                ..SecurityConfig::standard()
            },
            aggregation: AggregationConfig { base_url: None, timeout_secs: 15 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            query: QueryLimitsConfig::standard(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 8080,
                login_rate_limit_attempts: 5,
                login_rate_limit_window_secs: 15 * 60,
                enable_request_logging: false,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                ..SecurityConfig::standard()
            },
            aggregation: AggregationConfig { base_url: None, timeout_secs: 15 },
        }
    }
}

impl QueryLimitsConfig {
    fn standard() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            feed_default_limit: 20,
            feed_max_limit: 50,
            news_default_slides: 10,
            news_max_slides: 20,
        }
    }
}

impl SecurityConfig {
    fn standard() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "cms-service".to_string(),
            jwt_audience: "platform-console".to_string(),
            jwt_allowed_issuers: FALLBACK_ALLOWED_ISSUERS.iter().map(|s| s.to_string()).collect(),
            jwt_allow_empty_issuer: true,
            jwt_require_tenant_id: false,
            default_tenant_id: "default".to_string(),
            jwt_expiry_hours: 24,
            service_token: String::new(),
            cors_origins: vec![],
        }
    }
}

/// Comma-separated, lower-cased issuer list. Falls back to the built-in
/// issuers when nothing usable is configured.
pub fn parse_allowed_issuers(raw: &str) -> Vec<String> {
    let issuers: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if issuers.is_empty() {
        FALLBACK_ALLOWED_ISSUERS.iter().map(|s| s.to_string()).collect()
    } else {
        issuers
    }
}

/// `1/true/yes` and `0/false/no`, case-insensitive.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.query.max_limit, 100);
        assert_eq!(config.query.feed_max_limit, 50);
        assert_eq!(config.api.login_rate_limit_attempts, 5);
        assert_eq!(config.api.login_rate_limit_window_secs, 900);
        assert!(!config.api.trust_proxy_headers);
        assert_eq!(config.aggregation.timeout_secs, 15);
    }

    #[test]
    fn test_default_security_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.jwt_issuer, "cms-service");
        assert_eq!(config.security.default_tenant_id, "default");
        assert!(config.security.jwt_allow_empty_issuer);
        assert!(!config.security.jwt_require_tenant_id);
    }

    #[test]
    fn test_parse_allowed_issuers() {
        assert_eq!(parse_allowed_issuers(" CMS-Service , ,iam "), vec!["cms-service", "iam"]);
        assert_eq!(parse_allowed_issuers(" , "), vec!["cms-service", "iam-authorization-service"]);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
