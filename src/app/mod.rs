pub mod debug_tags_use_case;
pub mod ports;
pub mod sync_use_case;

pub use debug_tags_use_case::{DebugTagsUseCase, TagFilter};
pub use sync_use_case::SyncUseCase;
