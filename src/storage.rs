//! Row-level reads and writes over the catalog schema.
//!
//! Write helpers take a plain `&Connection` so they run inside whatever
//! transaction the caller holds; a `rusqlite::Transaction` derefs to one.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::constants::PAGE_SIZE;
use crate::domain::{Country, Language, StationRecord, Tag};
use crate::error::Result;
use crate::pipeline::processing::catalog::StationDraft;

/// Column list shared by every query that returns station rows.
pub(crate) const STATION_COLUMNS: &str = "s.id, s.uuid, s.name, s.stream_url, s.homepage_url, \
     s.icon_url, c.id, c.iso_3166_1";

/// Remove the whole catalog. Join rows and stations go before the reference
/// tables they point at.
pub fn wipe_catalog(conn: &Connection) -> Result<()> {
    let links = conn.execute("DELETE FROM station_language_links", [])?
        + conn.execute("DELETE FROM station_tag_links", [])?;
    let stations = conn.execute("DELETE FROM stations", [])?;
    let countries = conn.execute("DELETE FROM station_countries", [])?;
    let languages = conn.execute("DELETE FROM station_languages", [])?;
    let tags = conn.execute("DELETE FROM station_tags", [])?;
    debug!(links, stations, countries, languages, tags, "Wiped previous catalog generation");
    Ok(())
}

pub fn insert_country(conn: &Connection, iso_3166_1: &str) -> Result<i64> {
    conn.prepare_cached("INSERT INTO station_countries (iso_3166_1) VALUES (?1)")?
        .execute(params![iso_3166_1])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_language(conn: &Connection, iso_639_1: &str) -> Result<i64> {
    conn.prepare_cached("INSERT INTO station_languages (iso_639_1) VALUES (?1)")?
        .execute(params![iso_639_1])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_tag(conn: &Connection, name: &str) -> Result<i64> {
    conn.prepare_cached("INSERT INTO station_tags (name) VALUES (?1)")?
        .execute(params![name])?;
    Ok(conn.last_insert_rowid())
}

/// Insert a station and its join rows, returning the generated id.
pub fn insert_station(conn: &Connection, draft: &StationDraft) -> Result<i64> {
    conn.prepare_cached(
        "INSERT INTO stations (uuid, name, stream_url, homepage_url, icon_url, country_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?
    .execute(params![
        draft.uuid,
        draft.name,
        draft.stream_url,
        draft.homepage_url,
        draft.icon_url,
        draft.country_id
    ])?;
    let station_id = conn.last_insert_rowid();

    let mut link_language = conn.prepare_cached(
        "INSERT INTO station_language_links (station_id, language_id) VALUES (?1, ?2)",
    )?;
    for language_id in &draft.language_ids {
        link_language.execute(params![station_id, language_id])?;
    }

    let mut link_tag =
        conn.prepare_cached("INSERT INTO station_tag_links (station_id, tag_id) VALUES (?1, ?2)")?;
    for tag_id in &draft.tag_ids {
        link_tag.execute(params![station_id, tag_id])?;
    }

    Ok(station_id)
}

pub fn list_countries(conn: &Connection) -> Result<Vec<Country>> {
    let mut stmt =
        conn.prepare("SELECT id, iso_3166_1 FROM station_countries ORDER BY iso_3166_1 ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Country {
            id: row.get(0)?,
            iso_3166_1: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_languages(conn: &Connection) -> Result<Vec<Language>> {
    let mut stmt =
        conn.prepare("SELECT id, iso_639_1 FROM station_languages ORDER BY iso_639_1 ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Language {
            id: row.get(0)?,
            iso_639_1: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_tags(conn: &Connection) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name FROM station_tags ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// One page of the full catalog ordered by name. Pages start at 1; anything
/// lower is read as the first page.
pub fn list_stations(conn: &Connection, page: i64) -> Result<Vec<StationRecord>> {
    let page = page.max(1);
    let limit = PAGE_SIZE as i64;
    let offset = (page - 1).saturating_mul(limit);
    let sql = format!(
        "SELECT {STATION_COLUMNS} FROM stations s
         JOIN station_countries c ON c.id = s.country_id
         ORDER BY s.name ASC, s.uuid ASC
         LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit, offset], station_from_row)?;
    let stations = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    hydrate(conn, stations)
}

pub fn find_station_by_uuid(conn: &Connection, uuid: &str) -> Result<Option<StationRecord>> {
    let sql = format!(
        "SELECT {STATION_COLUMNS} FROM stations s
         JOIN station_countries c ON c.id = s.country_id
         WHERE s.uuid = ?1"
    );
    let station = conn
        .query_row(&sql, params![uuid], station_from_row)
        .optional()?;
    match station {
        Some(station) => Ok(hydrate(conn, vec![station])?.pop()),
        None => Ok(None),
    }
}

pub fn count_stations(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM stations", [], |row| row.get(0))?)
}

/// Map a row selected with [`STATION_COLUMNS`]; languages and tags are filled
/// in by [`hydrate`].
pub(crate) fn station_from_row(row: &Row<'_>) -> rusqlite::Result<StationRecord> {
    Ok(StationRecord {
        id: row.get(0)?,
        uuid: row.get(1)?,
        name: row.get(2)?,
        stream_url: row.get(3)?,
        homepage_url: row.get(4)?,
        icon_url: row.get(5)?,
        country: Country {
            id: row.get(6)?,
            iso_3166_1: row.get(7)?,
        },
        languages: Vec::new(),
        tags: Vec::new(),
    })
}

/// Attach language and tag associations to already loaded stations, with one
/// query per association kind.
pub(crate) fn hydrate(
    conn: &Connection,
    mut stations: Vec<StationRecord>,
) -> Result<Vec<StationRecord>> {
    if stations.is_empty() {
        return Ok(stations);
    }
    let index: HashMap<i64, usize> = stations
        .iter()
        .enumerate()
        .map(|(pos, station)| (station.id, pos))
        .collect();
    let ids: Vec<i64> = stations.iter().map(|station| station.id).collect();
    let placeholders = vec!["?"; ids.len()].join(", ");

    let mut languages = conn.prepare(&format!(
        "SELECT sl.station_id, l.id, l.iso_639_1 FROM station_language_links sl
         JOIN station_languages l ON l.id = sl.language_id
         WHERE sl.station_id IN ({placeholders})
         ORDER BY l.iso_639_1 ASC"
    ))?;
    let mut rows = languages.query(params_from_iter(ids.iter()))?;
    while let Some(row) = rows.next()? {
        if let Some(&pos) = index.get(&row.get::<_, i64>(0)?) {
            stations[pos].languages.push(Language {
                id: row.get(1)?,
                iso_639_1: row.get(2)?,
            });
        }
    }

    let mut tags = conn.prepare(&format!(
        "SELECT st.station_id, t.id, t.name FROM station_tag_links st
         JOIN station_tags t ON t.id = st.tag_id
         WHERE st.station_id IN ({placeholders})
         ORDER BY t.name ASC"
    ))?;
    let mut rows = tags.query(params_from_iter(ids.iter()))?;
    while let Some(row) = rows.next()? {
        if let Some(&pos) = index.get(&row.get::<_, i64>(0)?) {
            stations[pos].tags.push(Tag {
                id: row.get(1)?,
                name: row.get(2)?,
            });
        }
    }

    Ok(stations)
}

/// Cheapest possible round trip, used by the health endpoint.
pub fn ping(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}
