use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, error, info, instrument};

use crate::db::CatalogDb;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::catalog::{
    EligibleStation, ReferenceCodes, ReferenceLookups, StationMapper,
};
use crate::pipeline::processing::normalize::NormalizedStation;
use crate::pipeline::processing::quality_gate::QualityGate;
use crate::pipeline::processing::tag_mapper::TagMapper;
use crate::storage;

/// Summary of one full-refresh run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records_seen: usize,
    pub records_eligible: usize,
    pub records_skipped: usize,
    pub countries: usize,
    pub languages: usize,
    pub tags: usize,
    pub stations: usize,
    pub language_links: usize,
    pub tag_links: usize,
}

impl SyncReport {
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Counts produced inside the transaction
#[derive(Debug, Clone, Copy, Default)]
struct PopulateCounts {
    countries: usize,
    languages: usize,
    tags: usize,
    stations: usize,
    language_links: usize,
    tag_links: usize,
}

/// Replaces the whole catalog with a normalized batch.
///
/// Phases run in one transaction: wipe, populate references, populate
/// stations, commit. Any error before the commit rolls everything back and the
/// previous generation stays in place.
pub struct SyncOrchestrator {
    gate: Box<dyn QualityGate>,
    tag_mapper: Box<dyn TagMapper>,
}

impl SyncOrchestrator {
    pub fn new(gate: Box<dyn QualityGate>, tag_mapper: Box<dyn TagMapper>) -> Self {
        Self { gate, tag_mapper }
    }

    /// Filter the batch through the quality gate and map tags once per record.
    pub fn select_eligible<'a>(&self, batch: &'a [NormalizedStation]) -> Vec<EligibleStation<'a>> {
        batch
            .iter()
            .filter(|station| self.gate.is_eligible(station))
            .map(|station| EligibleStation {
                station,
                canonical_tags: self.tag_mapper.map_many(&station.tags),
            })
            .collect()
    }

    /// Run a full sync of `batch` against `db`.
    #[instrument(skip_all, fields(records = batch.len()))]
    pub fn run(&self, db: &mut CatalogDb, batch: &[NormalizedStation]) -> Result<SyncReport> {
        let started_at = Utc::now();
        let eligible = self.select_eligible(batch);
        let skipped = batch.len() - eligible.len();
        info!(eligible = eligible.len(), skipped, "Quality gate applied");

        let tx = db.begin_sync()?;
        let counts = match self.populate(&tx, &eligible) {
            Ok(counts) => counts,
            Err(e) => {
                // Dropping the transaction rolls back
                error!("Sync failed, keeping previous catalog: {}", e);
                metrics::sync::run_error();
                return Err(e);
            }
        };
        if let Err(e) = tx.commit() {
            error!("Sync commit failed, keeping previous catalog: {}", e);
            metrics::sync::run_error();
            return Err(e.into());
        }

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            records_seen: batch.len(),
            records_eligible: eligible.len(),
            records_skipped: skipped,
            countries: counts.countries,
            languages: counts.languages,
            tags: counts.tags,
            stations: counts.stations,
            language_links: counts.language_links,
            tag_links: counts.tag_links,
        };

        metrics::sync::records(report.records_seen, report.records_eligible);
        metrics::sync::references_written("country", report.countries);
        metrics::sync::references_written("language", report.languages);
        metrics::sync::references_written("tag", report.tags);
        metrics::sync::stations_written(report.stations);
        metrics::sync::run_success(report.duration_secs());
        info!(
            stations = report.stations,
            countries = report.countries,
            languages = report.languages,
            tags = report.tags,
            "Catalog replaced"
        );
        Ok(report)
    }

    /// Phases 1 to 3 on an open transaction. Does not commit.
    fn populate(&self, conn: &Connection, eligible: &[EligibleStation<'_>]) -> Result<PopulateCounts> {
        storage::wipe_catalog(conn)?;

        let codes = ReferenceCodes::collect(eligible);
        let lookups = ReferenceLookups::persist(conn, &codes)?;

        let mapper = StationMapper::new(&lookups, self.gate.as_ref());
        let mut counts = PopulateCounts {
            countries: lookups.countries.len(),
            languages: lookups.languages.len(),
            tags: lookups.tags.len(),
            ..PopulateCounts::default()
        };
        for station in eligible {
            let draft = mapper.map_to_draft(station)?;
            storage::insert_station(conn, &draft)?;
            counts.stations += 1;
            counts.language_links += draft.language_ids.len();
            counts.tag_links += draft.tag_ids.len();
        }
        debug!(stations = counts.stations, "Stations populated");

        Ok(counts)
    }
}
