use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid limit parameter")]
    InvalidLimit,

    #[error("invalid page parameter")]
    InvalidPage,

    #[error("invalid offset parameter")]
    InvalidOffset,

    #[error("invalid filter for '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

impl QueryError {
    pub fn invalid_filter(field: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidFilter { field: field.to_string(), reason: reason.into() }
    }
}
