//! Reference deduplication: one country, language and tag row per distinct code
//! across the eligible batch.

pub mod mapper;

use std::collections::{BTreeSet, HashMap};

use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::constants::ISO_639_1_LEN;
use crate::error::Result;
use crate::pipeline::processing::normalize::NormalizedStation;
use crate::storage;

pub use mapper::{EligibleStation, StationDraft, StationMapper};

/// Distinct reference codes used by an eligible batch.
///
/// Sets are ordered so the codes are inserted in a stable order, which keeps
/// generated ids stable between identical runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCodes {
    pub countries: BTreeSet<String>,
    pub languages: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl ReferenceCodes {
    /// Collect codes from eligible stations only. Language codes that are not
    /// exactly two characters are dropped here without notice.
    pub fn collect<'a, 'b: 'a, I>(batch: I) -> Self
    where
        I: IntoIterator<Item = &'a EligibleStation<'b>>,
    {
        let mut codes = Self::default();
        for eligible in batch {
            codes.add(eligible.station, &eligible.canonical_tags);
        }
        codes
    }

    fn add(&mut self, station: &NormalizedStation, canonical_tags: &BTreeSet<String>) {
        self.countries.insert(station.country_code.clone());
        self.languages.extend(
            station
                .language_codes
                .iter()
                .filter(|code| is_language_code(code))
                .cloned(),
        );
        self.tags.extend(canonical_tags.iter().cloned());
    }
}

pub fn is_language_code(code: &str) -> bool {
    code.chars().count() == ISO_639_1_LEN
}

/// Code to generated id, per reference kind. Lives for one sync run only.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLookups {
    pub countries: HashMap<String, i64>,
    pub languages: HashMap<String, i64>,
    pub tags: HashMap<String, i64>,
}

impl ReferenceLookups {
    /// Persist every code once and remember the ids it was given.
    #[instrument(skip_all, fields(
        countries = codes.countries.len(),
        languages = codes.languages.len(),
        tags = codes.tags.len()
    ))]
    pub fn persist(conn: &Connection, codes: &ReferenceCodes) -> Result<Self> {
        let mut lookups = Self::default();
        for code in &codes.countries {
            let id = storage::insert_country(conn, code)?;
            lookups.countries.insert(code.clone(), id);
        }
        for code in &codes.languages {
            let id = storage::insert_language(conn, code)?;
            lookups.languages.insert(code.clone(), id);
        }
        for name in &codes.tags {
            let id = storage::insert_tag(conn, name)?;
            lookups.tags.insert(name.clone(), id);
        }
        debug!("Reference tables populated");
        Ok(lookups)
    }

    pub fn country_id(&self, code: &str) -> Option<i64> {
        self.countries.get(code).copied()
    }

    pub fn language_id(&self, code: &str) -> Option<i64> {
        self.languages.get(code).copied()
    }

    pub fn tag_id(&self, name: &str) -> Option<i64> {
        self.tags.get(name).copied()
    }
}
