//! Filtered station lookup behind the search endpoint.

use rusqlite::{types::Value, Connection};
use tracing::debug;

use crate::constants::PAGE_SIZE;
use crate::error::{CatalogError, Result};
use crate::storage::{self, STATION_COLUMNS};
use crate::domain::StationRecord;

/// Search filters. Every present filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-sensitive substring of the station name
    pub name: Option<String>,
    /// Exact ISO 3166-1 code
    pub country: Option<String>,
    /// Exact ISO 639-1 code
    pub language: Option<String>,
    /// Exact canonical tag name
    pub tag: Option<String>,
}

impl SearchQuery {
    /// Build a query from raw request parameters. Empty values count as
    /// absent; country codes are upper-cased, language codes and tags
    /// lower-cased.
    pub fn from_params(
        name: Option<&str>,
        country: Option<&str>,
        language: Option<&str>,
        tag: Option<&str>,
    ) -> Self {
        Self {
            name: present(name).map(str::to_string),
            country: present(country).map(str::to_uppercase),
            language: present(language).map(str::to_lowercase),
            tag: present(tag).map(str::to_lowercase),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.country.is_none() && self.language.is_none() && self.tag.is_none()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Stations matching every filter, ordered by name then uuid, at most one page.
pub fn search(conn: &Connection, query: &SearchQuery) -> Result<Vec<StationRecord>> {
    if query.is_empty() {
        return Err(CatalogError::EmptySearch);
    }

    let mut joins = String::new();
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(name) = &query.name {
        // LIKE would ignore case for ASCII
        conditions.push("instr(s.name, ?) > 0");
        params.push(Value::Text(name.clone()));
    }
    if let Some(country) = &query.country {
        conditions.push("c.iso_3166_1 = ?");
        params.push(Value::Text(country.clone()));
    }
    if let Some(language) = &query.language {
        joins.push_str(
            " JOIN station_language_links sl ON sl.station_id = s.id
              JOIN station_languages l ON l.id = sl.language_id",
        );
        conditions.push("l.iso_639_1 = ?");
        params.push(Value::Text(language.clone()));
    }
    if let Some(tag) = &query.tag {
        joins.push_str(
            " JOIN station_tag_links st ON st.station_id = s.id
              JOIN station_tags t ON t.id = st.tag_id",
        );
        conditions.push("t.name = ?");
        params.push(Value::Text(tag.clone()));
    }
    params.push(Value::Integer(PAGE_SIZE as i64));

    let sql = format!(
        "SELECT {STATION_COLUMNS} FROM stations s
         JOIN station_countries c ON c.id = s.country_id{joins}
         WHERE {}
         ORDER BY s.name ASC, s.uuid ASC
         LIMIT ?",
        conditions.join(" AND ")
    );
    debug!(?query, "Running station search");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), storage::station_from_row)?;
    let stations = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    storage::hydrate(conn, stations)
}
