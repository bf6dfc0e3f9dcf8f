// Sync pipeline: export ingestion, record processing, and the transactional run

pub mod ingestion;
pub mod orchestrator;
pub mod processing;

pub use orchestrator::{SyncOrchestrator, SyncReport};
