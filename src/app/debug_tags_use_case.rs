use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::pipeline::ingestion::RawRecord;
use crate::pipeline::processing::normalize::NormalizedStation;
use crate::pipeline::processing::TagMapper;

/// Which lines of the listing to keep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Mapped,
    Unmapped,
}

impl TagFilter {
    pub fn from_flags(mapped: bool, unmapped: bool) -> Self {
        match (mapped, unmapped) {
            (true, _) => TagFilter::Mapped,
            (_, true) => TagFilter::Unmapped,
            _ => TagFilter::All,
        }
    }

    fn keeps(&self, mapped: Option<&str>) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Mapped => mapped.is_some(),
            TagFilter::Unmapped => mapped.is_none(),
        }
    }
}

/// Lists every distinct raw tag of an export next to its canonical mapping
pub struct DebugTagsUseCase {
    mapper: Box<dyn TagMapper>,
}

impl DebugTagsUseCase {
    pub fn new(mapper: Box<dyn TagMapper>) -> Self {
        Self { mapper }
    }

    /// One `"<raw> => <mapped>"` line per distinct tag, sorted by raw tag.
    /// Unmapped tags have nothing after the arrow. Every record counts, eligible
    /// or not.
    pub fn listing(&self, records: &[RawRecord], filter: TagFilter) -> Vec<String> {
        let raw_tags: BTreeSet<String> = records
            .iter()
            .flat_map(|record| NormalizedStation::from_raw(record).tags)
            .collect();

        raw_tags
            .into_iter()
            .filter_map(|raw| {
                let mapped = self.mapper.map(&raw);
                filter
                    .keeps(mapped.as_deref())
                    .then(|| format!("{} => {}", raw, mapped.unwrap_or_default()))
            })
            .collect()
    }

    pub fn save(lines: &[String], path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, lines.join("\n"))?;
        info!(lines = lines.len(), "Tag listing saved to {}", path.display());
        Ok(())
    }
}
