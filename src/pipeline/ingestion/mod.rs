pub mod export;

pub use export::{decode_export, ExportFetcher, RawRecord};
