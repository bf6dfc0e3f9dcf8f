use tracing::{error, info};

use crate::db::CatalogDb;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::ExportFetcher;
use crate::pipeline::orchestrator::{SyncOrchestrator, SyncReport};
use crate::pipeline::processing::normalize::normalize_batch;
use crate::pipeline::processing::{DefaultQualityGate, VocabularyTagMapper};

/// Fetch, normalize and replace the catalog in one run
pub struct SyncUseCase {
    fetcher: ExportFetcher,
    orchestrator: SyncOrchestrator,
}

impl SyncUseCase {
    pub fn new(fetcher: ExportFetcher, orchestrator: SyncOrchestrator) -> Self {
        Self {
            fetcher,
            orchestrator,
        }
    }

    /// Create a use case with the default quality gate and tag vocabulary
    pub fn with_defaults(fetcher: ExportFetcher) -> Self {
        Self::new(
            fetcher,
            SyncOrchestrator::new(
                Box::new(DefaultQualityGate::new()),
                Box::new(VocabularyTagMapper::new()),
            ),
        )
    }

    /// The export is fully downloaded and parsed before the write transaction
    /// opens, so a failed fetch never touches the stored catalog.
    pub async fn run(&self, db: &mut CatalogDb) -> Result<SyncReport> {
        info!("Fetching export from {}", self.fetcher.url());
        let raw = match self.fetcher.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Export fetch failed: {}", e);
                metrics::sync::run_error();
                return Err(e);
            }
        };

        let batch = normalize_batch(&raw);
        self.orchestrator.run(db, &batch)
    }
}
