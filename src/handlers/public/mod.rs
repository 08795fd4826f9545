// handlers/public/mod.rs - Unauthenticated endpoints (/, /health, /api/v1/*)

pub mod content;
pub mod feed;
pub mod health;
pub mod interactions;
pub mod media;
pub mod pages;
pub mod posts;

pub use content::content_get;
pub use feed::{for_you as feed_for_you, news as feed_news};
pub use health::{health, root};
pub use interactions::{bookmarks_get, interaction_create, interaction_delete};
pub use media::{media_create, media_delete, media_get, media_list};
pub use pages::{page_create, page_delete, page_get, page_update, pages_list};
pub use posts::{post_create, post_delete, post_get, post_update, posts_list};
