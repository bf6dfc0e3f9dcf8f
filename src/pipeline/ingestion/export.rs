use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::HttpClientPort;
use crate::error::{CatalogError, Result};
use crate::observability::metrics;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One station entry from the radio-browser.info export.
///
/// Only the fields the catalog uses are declared; the export carries many more
/// and serde ignores them. Any of these may be absent or `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub stationuuid: Option<String>,
    pub name: Option<String>,
    pub url_stream: Option<String>,
    pub url_homepage: Option<String>,
    pub url_favicon: Option<String>,
    pub iso_3166_1: Option<String>,
    pub iso_639: Option<String>,
    pub tags: Option<String>,
}

/// Downloads the export and turns it into raw records.
pub struct ExportFetcher {
    http: Arc<dyn HttpClientPort>,
    url: String,
}

impl ExportFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the whole export. Any failure here is fatal for the run.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let started = Instant::now();
        let response = self.http.get(&self.url).await.map_err(|e| {
            metrics::export::fetch_error("transport");
            CatalogError::Transport(e)
        })?;

        if response.status != 200 {
            warn!(status = response.status, "Export download rejected");
            metrics::export::fetch_error("status");
            return Err(CatalogError::Fetch { status: response.status });
        }

        debug!(
            content_type = %response.content_type,
            content_length = response.content_length,
            "Export downloaded"
        );
        metrics::export::bytes(response.bytes.len());

        let records = decode_export(&response.bytes).map_err(|e| {
            metrics::export::fetch_error("decode");
            e
        })?;

        metrics::export::fetch_success();
        metrics::export::duration(started.elapsed().as_secs_f64());
        info!(records = records.len(), "Export parsed");
        Ok(records)
    }
}

/// Decode an export body: gzip-compressed JSON, or plain JSON when the transport
/// already removed the content encoding.
pub fn decode_export(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(CatalogError::Decompress)?;
        Ok(serde_json::from_slice(&json)?)
    } else {
        Ok(serde_json::from_slice(bytes)?)
    }
}
