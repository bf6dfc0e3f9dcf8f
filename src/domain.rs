//! Stored catalog entities as the read path returns them.

use serde::Serialize;

/// A country with at least one station, ISO 3166-1 alpha-2, upper case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Country {
    pub id: i64,
    pub iso_3166_1: String,
}

/// A language with at least one station, ISO 639-1, lower case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Language {
    pub id: i64,
    pub iso_639_1: String,
}

/// A canonical tag name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A station row joined with its country, languages and tags.
///
/// Languages and tags are ordered by code and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationRecord {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub stream_url: String,
    pub homepage_url: Option<String>,
    pub icon_url: Option<String>,
    pub country: Country,
    pub languages: Vec<Language>,
    pub tags: Vec<Tag>,
}
