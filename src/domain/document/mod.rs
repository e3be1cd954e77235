//! Document value type and content addressing

mod content_id;
mod entity;

pub use content_id::ContentId;
pub use entity::{Document, SIMILARITY_UNSET};
