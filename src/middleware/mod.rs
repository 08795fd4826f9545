pub mod auth;
pub mod internal_auth;
pub mod rate_limit;
pub mod response;

pub use auth::{admin_auth_middleware, bearer_token};
pub use internal_auth::internal_auth_middleware;
pub use rate_limit::{client_key, LoginRateLimiter, RateDecision, SharedRateLimiter};
pub use response::{ApiResponse, ApiResult, PageResult, Paginated};
