pub mod claims;
pub mod jwt;
pub mod password;
pub mod principal;

pub use claims::JwtClaims;
pub use jwt::{issue_token, parse_token, JwtSettings, TokenError};
pub use password::{hash_password, verify_password, PasswordError};
pub use principal::AdminPrincipal;
