pub mod admin_user_service;
pub mod aggregation_service;
pub mod content_service;
pub mod feed_service;
pub mod interaction_service;
pub mod site_service;
pub mod source_service;
pub mod transcript_service;

pub use admin_user_service::{AccountDirectory, AdminUserService};
pub use aggregation_service::{AggregationClient, AggregationError};
pub use content_service::ContentService;
pub use feed_service::FeedService;
pub use interaction_service::InteractionService;
pub use site_service::SiteService;
pub use source_service::SourceService;
pub use transcript_service::TranscriptService;
