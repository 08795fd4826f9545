// handlers/internal/mod.rs - Service-to-service endpoints (/internal/*)

pub mod content_items;
pub mod transcripts;

pub use content_items::{content_item_artifacts, content_item_create, content_item_status, content_item_update};
pub use transcripts::transcript_create;
