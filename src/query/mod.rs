pub mod builder;
pub mod cursor;
pub mod error;
pub mod filter_value;
pub mod pagination;
pub mod parser;
pub mod query_order;
pub mod query_where;
pub mod resources;
pub mod types;

pub use builder::{apply_query, PreparedQuery};
pub use cursor::{decode_cursor, encode_cursor, CursorError, CursorParams, CursorPosition};
pub use error::QueryError;
pub use pagination::{build_pagination_links, QueryLinks, QueryMeta};
pub use parser::QueryParser;
pub use types::*;
