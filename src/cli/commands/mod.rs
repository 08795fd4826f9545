pub mod password;
pub mod query;
pub mod token;
