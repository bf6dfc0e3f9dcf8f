use crate::pipeline::ingestion::RawRecord;

/// Separators radio-browser users put between tags, on top of the plain comma
const TAG_SEPARATORS: [&str; 5] = [";", "/", "|", " - ", " & "];

/// A station record converted into canonical in-memory form.
///
/// Free-text fields are trimmed and case-normalized; multi-value fields are split
/// but not yet deduplicated or validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStation {
    /// External station uuid from the export
    pub id: String,
    pub name: String,
    pub stream_url: String,
    pub homepage_url: Option<String>,
    pub icon_url: Option<String>,
    /// Upper-cased, not length checked here
    pub country_code: String,
    /// Lower-cased pieces of the `iso_639` field, duplicates kept
    pub language_codes: Vec<String>,
    /// Lower-cased raw tags, before mapping onto the canonical vocabulary
    pub tags: Vec<String>,
}

impl NormalizedStation {
    /// Normalize one raw export entry. Never fails: missing fields degrade to
    /// empty strings or `None`.
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            id: raw.stationuuid.clone().unwrap_or_default(),
            name: raw.name.clone().unwrap_or_default(),
            stream_url: raw.url_stream.clone().unwrap_or_default(),
            homepage_url: optional_url(raw.url_homepage.as_deref()),
            icon_url: optional_url(raw.url_favicon.as_deref()),
            country_code: raw.iso_3166_1.as_deref().unwrap_or_default().to_uppercase(),
            language_codes: split_language_codes(raw.iso_639.as_deref().unwrap_or_default()),
            tags: split_tags(raw.tags.as_deref().unwrap_or_default()),
        }
    }
}

/// Normalize a whole export batch, preserving order.
pub fn normalize_batch(records: &[RawRecord]) -> Vec<NormalizedStation> {
    records.iter().map(NormalizedStation::from_raw).collect()
}

fn optional_url(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Split the comma separated `iso_639` field.
pub fn split_language_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|code| code.to_lowercase().trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

/// Split the free-text `tags` field on every known separator.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut joined = raw.to_string();
    for separator in TAG_SEPARATORS {
        joined = joined.replace(separator, ",");
    }
    joined
        .split(',')
        .map(|tag| tag.to_lowercase().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
