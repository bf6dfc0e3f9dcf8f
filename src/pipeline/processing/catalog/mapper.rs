use std::collections::BTreeSet;

use crate::error::{CatalogError, Result};
use crate::pipeline::processing::catalog::ReferenceLookups;
use crate::pipeline::processing::normalize::NormalizedStation;
use crate::pipeline::processing::quality_gate::QualityGate;

/// A station that passed the quality gate, with its tags already mapped onto
/// the canonical vocabulary.
#[derive(Debug, Clone)]
pub struct EligibleStation<'a> {
    pub station: &'a NormalizedStation,
    pub canonical_tags: BTreeSet<String>,
}

/// A station row ready to insert. Associations are plain id sets resolved from
/// the run's reference lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationDraft {
    pub uuid: String,
    pub name: String,
    pub stream_url: String,
    pub homepage_url: Option<String>,
    pub icon_url: Option<String>,
    pub country_id: i64,
    pub language_ids: BTreeSet<i64>,
    pub tag_ids: BTreeSet<i64>,
}

/// Builds station rows from eligible records and the run's lookups
pub struct StationMapper<'a> {
    lookups: &'a ReferenceLookups,
    gate: &'a dyn QualityGate,
}

impl<'a> StationMapper<'a> {
    pub fn new(lookups: &'a ReferenceLookups, gate: &'a dyn QualityGate) -> Self {
        Self { lookups, gate }
    }

    /// Languages and tags missing from the lookups are left off the row.
    /// A missing country cannot happen for an eligible record and is reported
    /// as an integrity error, which aborts the run.
    pub fn map_to_draft(&self, eligible: &EligibleStation<'_>) -> Result<StationDraft> {
        let station = eligible.station;
        let country_id = self
            .lookups
            .country_id(&station.country_code)
            .ok_or_else(|| {
                CatalogError::Integrity(format!(
                    "station {} references unknown country {}",
                    station.id, station.country_code
                ))
            })?;

        let language_ids = station
            .language_codes
            .iter()
            .filter_map(|code| self.lookups.language_id(code))
            .collect();

        let tag_ids = eligible
            .canonical_tags
            .iter()
            .filter_map(|name| self.lookups.tag_id(name))
            .collect();

        Ok(StationDraft {
            uuid: station.id.clone(),
            name: station.name.clone(),
            stream_url: station.stream_url.clone(),
            homepage_url: self.gate.homepage_url(station),
            icon_url: self.gate.icon_url(station),
            country_id,
            language_ids,
            tag_ids,
        })
    }
}
