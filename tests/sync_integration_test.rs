use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tempfile::tempdir;

use radio_catalog::app::ports::{HttpClientPort, HttpGetResult};
use radio_catalog::app::SyncUseCase;
use radio_catalog::config::DatabaseConfig;
use radio_catalog::db::CatalogDb;
use radio_catalog::pipeline::ingestion::ExportFetcher;
use radio_catalog::pipeline::processing::CANONICAL_TAGS;
use radio_catalog::storage;
use radio_catalog::CatalogError;

/// Serves a fixed gzip-compressed export
struct GzipExport {
    status: u16,
    body: Vec<u8>,
}

impl GzipExport {
    fn new(records: Value) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(records.to_string().as_bytes())
            .expect("gzip write");
        Self {
            status: 200,
            body: encoder.finish().expect("gzip finish"),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

#[async_trait]
impl HttpClientPort for GzipExport {
    async fn get(&self, _url: &str) -> std::result::Result<HttpGetResult, String> {
        Ok(HttpGetResult {
            status: self.status,
            bytes: self.body.clone(),
            content_type: "application/gzip".to_string(),
            content_length: self.body.len() as u64,
        })
    }
}

async fn sync(db: &mut CatalogDb, export: GzipExport) -> radio_catalog::Result<radio_catalog::pipeline::SyncReport> {
    let fetcher = ExportFetcher::new(Arc::new(export), "http://stub/stations.json.gz");
    SyncUseCase::with_defaults(fetcher).run(db).await
}

fn uuids(db: &CatalogDb) -> BTreeSet<String> {
    let mut all = BTreeSet::new();
    let mut page = 1;
    loop {
        let stations = storage::list_stations(db.connection(), page).unwrap();
        if stations.is_empty() {
            break;
        }
        all.extend(stations.into_iter().map(|s| s.uuid));
        page += 1;
    }
    all
}

fn reference_codes(db: &CatalogDb) -> (Vec<String>, Vec<String>, Vec<String>) {
    let conn = db.connection();
    (
        storage::list_countries(conn)
            .unwrap()
            .into_iter()
            .map(|c| c.iso_3166_1)
            .collect(),
        storage::list_languages(conn)
            .unwrap()
            .into_iter()
            .map(|l| l.iso_639_1)
            .collect(),
        storage::list_tags(conn)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect(),
    )
}

fn sample_export() -> Value {
    json!([
        {
            "stationuuid": "u1",
            "name": "Radio X",
            "url_stream": "http://x/s.mp3",
            "iso_3166_1": "lu",
            "iso_639": "FR",
            "tags": "Pop;Rock",
            "votes": 12
        },
        {
            "stationuuid": "u2",
            "name": "Radio Y",
            "url_stream": "https://y/live",
            "url_homepage": "https://y.example.com",
            "url_favicon": "y.example.com/icon.png",
            "iso_3166_1": "LU",
            "iso_639": "lb,de",
            "tags": "news talk|80s|polka"
        },
        {
            "stationuuid": "u3",
            "name": "Radio Z",
            "url_stream": "http://z/s",
            "iso_3166_1": "DE",
            "iso_639": "de",
            "tags": null
        }
    ])
}

#[tokio::test]
async fn test_end_to_end_single_station() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    let export = json!([{
        "stationuuid": "u1",
        "name": "Radio X",
        "url_stream": "http://x/s.mp3",
        "iso_3166_1": "lu",
        "iso_639": "FR",
        "tags": "Pop;Rock"
    }]);

    let report = sync(&mut db, GzipExport::new(export)).await?;
    assert_eq!(report.stations, 1);

    let station = storage::find_station_by_uuid(db.connection(), "u1")?.expect("station stored");
    assert_eq!(station.name, "Radio X");
    assert_eq!(station.stream_url, "http://x/s.mp3");
    assert_eq!(station.country.iso_3166_1, "LU");
    let languages: Vec<_> = station.languages.iter().map(|l| l.iso_639_1.as_str()).collect();
    assert_eq!(languages, vec!["fr"]);
    let tags: Vec<_> = station.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["pop", "rock"]);
    Ok(())
}

#[tokio::test]
async fn test_sync_is_idempotent() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;

    sync(&mut db, GzipExport::new(sample_export())).await?;
    let first_uuids = uuids(&db);
    let first_codes = reference_codes(&db);

    sync(&mut db, GzipExport::new(sample_export())).await?;

    assert_eq!(uuids(&db), first_uuids);
    assert_eq!(reference_codes(&db), first_codes);
    assert_eq!(first_uuids.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_shared_country_is_stored_once() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    sync(&mut db, GzipExport::new(sample_export())).await?;

    let conn = db.connection();
    let countries = storage::list_countries(conn)?;
    assert_eq!(countries.len(), 2);
    let lu = countries.iter().find(|c| c.iso_3166_1 == "LU").expect("LU stored");

    let u1 = storage::find_station_by_uuid(conn, "u1")?.expect("u1");
    let u2 = storage::find_station_by_uuid(conn, "u2")?.expect("u2");
    assert_eq!(u1.country.id, lu.id);
    assert_eq!(u2.country.id, lu.id);
    Ok(())
}

#[tokio::test]
async fn test_station_tags_stay_in_vocabulary() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    sync(&mut db, GzipExport::new(sample_export())).await?;

    for uuid in ["u1", "u2", "u3"] {
        let station = storage::find_station_by_uuid(db.connection(), uuid)?.expect("stored");
        for tag in &station.tags {
            assert!(CANONICAL_TAGS.contains(&tag.name.as_str()), "{} not canonical", tag.name);
        }
    }

    let u2 = storage::find_station_by_uuid(db.connection(), "u2")?.expect("u2");
    let tags: Vec<_> = u2.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["80s", "news"]);
    // Icon without a scheme is dropped, homepage kept
    assert_eq!(u2.homepage_url.as_deref(), Some("https://y.example.com"));
    assert!(u2.icon_url.is_none());
    Ok(())
}

#[tokio::test]
async fn test_ineligible_records_create_no_references() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    let export = json!([
        {
            "stationuuid": "ok",
            "name": "Good Radio",
            "url_stream": "http://good/s",
            "iso_3166_1": "LU",
            "iso_639": "fr",
            "tags": "jazz"
        },
        {
            "stationuuid": "ftp",
            "name": "FTP Radio",
            "url_stream": "ftp://bad/s",
            "iso_3166_1": "AT",
            "iso_639": "it",
            "tags": "techno"
        },
        {
            "stationuuid": "long",
            "name": "A station name that is far too long",
            "url_stream": "http://long/s",
            "iso_3166_1": "CH",
            "iso_639": "rm",
            "tags": "metal"
        }
    ]);

    let report = sync(&mut db, GzipExport::new(export)).await?;

    assert_eq!(report.records_seen, 3);
    assert_eq!(report.records_eligible, 1);
    assert_eq!(
        reference_codes(&db),
        (vec!["LU".to_string()], vec!["fr".to_string()], vec!["jazz".to_string()])
    );
    Ok(())
}

#[tokio::test]
async fn test_records_without_uuid_or_name_are_skipped() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    let export = json!([
        {"stationuuid": "u9", "name": "Kept Radio", "url_stream": "http://k/s", "iso_3166_1": "LU"},
        {"name": "NoId1", "url_stream": "http://a/s", "iso_3166_1": "LU"},
        {"stationuuid": "", "name": "NoId2", "url_stream": "http://b/s", "iso_3166_1": "LU"},
        {"stationuuid": "u10", "name": "  ", "url_stream": "http://c/s", "iso_3166_1": "LU"}
    ]);

    let report = sync(&mut db, GzipExport::new(export)).await?;

    assert_eq!(report.records_seen, 4);
    assert_eq!(report.records_eligible, 1);
    assert_eq!(report.records_skipped, 3);
    assert_eq!(uuids(&db), BTreeSet::from(["u9".to_string()]));
    Ok(())
}

#[tokio::test]
async fn test_failed_persistence_keeps_previous_catalog() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    sync(&mut db, GzipExport::new(sample_export())).await?;
    let before_uuids = uuids(&db);
    let before_codes = reference_codes(&db);

    // Same uuid twice violates the unique constraint while stations are written
    let export = json!([
        {"stationuuid": "dup", "name": "One", "url_stream": "http://a/s", "iso_3166_1": "FR"},
        {"stationuuid": "dup", "name": "Two", "url_stream": "http://b/s", "iso_3166_1": "FR"}
    ]);
    let err = sync(&mut db, GzipExport::new(export)).await.unwrap_err();

    assert!(matches!(err, CatalogError::Database(_)));
    assert_eq!(uuids(&db), before_uuids);
    assert_eq!(reference_codes(&db), before_codes);
    Ok(())
}

#[tokio::test]
async fn test_failed_fetch_leaves_catalog_untouched() -> Result<()> {
    let mut db = CatalogDb::open_in_memory()?;
    sync(&mut db, GzipExport::new(sample_export())).await?;

    let err = sync(&mut db, GzipExport::failing(404)).await.unwrap_err();

    assert!(matches!(err, CatalogError::Fetch { status: 404 }));
    assert_eq!(uuids(&db).len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_sync_is_refused_and_readers_see_old_generation() -> Result<()> {
    let dir = tempdir()?;
    let config = DatabaseConfig {
        path: dir.path().join("catalog.db").to_string_lossy().into_owned(),
        busy_timeout_ms: 50,
    };
    let mut writer = CatalogDb::open(&config)?;
    sync(&mut writer, GzipExport::new(sample_export())).await?;

    let mut other = CatalogDb::open(&config)?;
    let tx = writer.begin_sync()?;
    storage::wipe_catalog(&tx)?;

    // A second run cannot take the write lock while the first one holds it
    assert!(other.begin_sync().is_err());
    // and readers keep seeing the committed generation
    assert_eq!(storage::count_stations(other.connection())?, 3);

    drop(tx);
    assert_eq!(storage::count_stations(writer.connection())?, 3);
    Ok(())
}
