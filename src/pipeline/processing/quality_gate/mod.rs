use crate::constants::{
    ISO_3166_1_LEN, STATION_HOMEPAGE_URL_MAX_LEN, STATION_ICON_URL_MAX_LEN, STATION_NAME_MAX_LEN,
    STATION_STREAM_URL_MAX_LEN, URL_SCHEME_PREFIX,
};
use crate::pipeline::processing::normalize::NormalizedStation;

/// Column bounds a station must fit before it is stored
#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    pub max_name_len: usize,
    pub max_stream_url_len: usize,
    pub max_homepage_url_len: usize,
    pub max_icon_url_len: usize,
    pub country_code_len: usize,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            max_name_len: STATION_NAME_MAX_LEN,
            max_stream_url_len: STATION_STREAM_URL_MAX_LEN,
            max_homepage_url_len: STATION_HOMEPAGE_URL_MAX_LEN,
            max_icon_url_len: STATION_ICON_URL_MAX_LEN,
            country_code_len: ISO_3166_1_LEN,
        }
    }
}

/// Decides which normalized stations are stored at all, and which optional
/// URLs survive on the stored row.
pub trait QualityGate: Send + Sync {
    /// Whether the record is stored. Ineligible records are skipped, not errors.
    fn is_eligible(&self, station: &NormalizedStation) -> bool;

    /// Homepage URL to store, `None` when it does not fit the column.
    fn homepage_url(&self, station: &NormalizedStation) -> Option<String>;

    /// Icon URL to store, `None` when it does not fit the column.
    fn icon_url(&self, station: &NormalizedStation) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }
}

impl QualityGate for DefaultQualityGate {
    fn is_eligible(&self, station: &NormalizedStation) -> bool {
        !station.id.trim().is_empty()
            && !station.name.trim().is_empty()
            && char_len(&station.name) <= self.config.max_name_len
            && char_len(&station.stream_url) <= self.config.max_stream_url_len
            && station.stream_url.starts_with(URL_SCHEME_PREFIX)
            && char_len(&station.country_code) == self.config.country_code_len
    }

    fn homepage_url(&self, station: &NormalizedStation) -> Option<String> {
        storable_url(station.homepage_url.as_deref(), self.config.max_homepage_url_len)
    }

    fn icon_url(&self, station: &NormalizedStation) -> Option<String> {
        storable_url(station.icon_url.as_deref(), self.config.max_icon_url_len)
    }
}

fn storable_url(url: Option<&str>, max_len: usize) -> Option<String> {
    url.filter(|u| u.starts_with(URL_SCHEME_PREFIX) && char_len(u) <= max_len)
        .map(str::to_string)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}
