use std::net::SocketAddr;

use axum::{
    extract::Query,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use hyper::Server;
use rusqlite::Connection;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::db::CatalogReader;
use crate::error::CatalogError;
use crate::observability::metrics;
use crate::search::{self, SearchQuery};
use crate::storage;

/// Error body returned by the read API
struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CatalogError::EmptySearch => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Run `f` on a fresh read connection off the async workers.
async fn read<T, F>(reader: &CatalogReader, f: F) -> crate::error::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> crate::error::Result<T> + Send + 'static,
{
    let reader = reader.clone();
    tokio::task::spawn_blocking(move || {
        let conn = reader.connect()?;
        f(&conn)
    })
    .await?
}

/// Health check endpoint
async fn health(Extension(reader): Extension<CatalogReader>) -> impl IntoResponse {
    let healthy = match read(&reader, |conn| storage::ping(conn)).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Database health check failed: {}", e);
            false
        }
    };
    let (status, label) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (
        status,
        Json(serde_json::json!({
            "status": label,
            "checks": { "database": healthy }
        })),
    )
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
}

async fn all_stations(
    Extension(reader): Extension<CatalogReader>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1);
    let stations = read(&reader, move |conn| storage::list_stations(conn, page)).await?;
    Ok(Json(stations))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    name: Option<String>,
    country: Option<String>,
    language: Option<String>,
    tag: Option<String>,
}

async fn search_stations(
    Extension(reader): Extension<CatalogReader>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SearchQuery::from_params(
        params.name.as_deref(),
        params.country.as_deref(),
        params.language.as_deref(),
        params.tag.as_deref(),
    );
    if query.is_empty() {
        metrics::search::rejected();
        return Err(CatalogError::EmptySearch.into());
    }
    metrics::search::request();
    let stations = read(&reader, move |conn| search::search(conn, &query)).await?;
    Ok(Json(stations))
}

async fn countries(
    Extension(reader): Extension<CatalogReader>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(read(&reader, |conn| storage::list_countries(conn)).await?))
}

async fn languages(
    Extension(reader): Extension<CatalogReader>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(read(&reader, |conn| storage::list_languages(conn)).await?))
}

async fn tags(Extension(reader): Extension<CatalogReader>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(read(&reader, |conn| storage::list_tags(conn)).await?))
}

/// Create the read API router
pub fn create_server(reader: CatalogReader) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/station/all", get(all_stations))
        .route("/api/v1/station/search", get(search_stations))
        .route("/api/v1/station/countries", get(countries))
        .route("/api/v1/station/languages", get(languages))
        .route("/api/v1/station/tags", get(tags))
        .layer(Extension(reader))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(reader: CatalogReader, port: u16) -> anyhow::Result<()> {
    info!("Serving catalog from {}", reader.path().display());
    let app = create_server(reader);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{port}");
    info!("Health check: http://localhost:{port}/api/v1/health");

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::CatalogDb;
    use crate::pipeline::processing::catalog::StationDraft;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::BTreeSet;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn config(dir: &TempDir, file: &str) -> DatabaseConfig {
        DatabaseConfig {
            path: dir.path().join(file).display().to_string(),
            busy_timeout_ms: 100,
        }
    }

    /// The directory must outlive the router
    fn seeded() -> (TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, "catalog.db");
        let db = CatalogDb::open(&config).unwrap();
        let conn = db.connection();
        let lu = storage::insert_country(conn, "LU").unwrap();
        let fr = storage::insert_language(conn, "fr").unwrap();
        let pop = storage::insert_tag(conn, "pop").unwrap();
        for (uuid, name) in [("u1", "Radio X"), ("u2", "Pop Hits")] {
            storage::insert_station(
                conn,
                &StationDraft {
                    uuid: uuid.to_string(),
                    name: name.to_string(),
                    stream_url: "http://x/s.mp3".to_string(),
                    homepage_url: None,
                    icon_url: None,
                    country_id: lu,
                    language_ids: BTreeSet::from([fr]),
                    tag_ids: BTreeSet::from([pop]),
                },
            )
            .unwrap();
        }
        (dir, create_server(CatalogReader::new(&config)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = seeded();
        let (status, body) = get_json(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"status": "healthy", "checks": {"database": true}})
        );
    }

    #[tokio::test]
    async fn test_health_without_catalog_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_server(CatalogReader::new(&config(&dir, "missing.db")));

        let (status, body) = get_json(app, "/api/v1/health").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            serde_json::json!({"status": "unhealthy", "checks": {"database": false}})
        );
    }

    #[tokio::test]
    async fn test_all_stations_json_shape() {
        let (_dir, app) = seeded();
        let (status, body) = get_json(app.clone(), "/api/v1/station/all?page=0").await;
        assert_eq!(status, StatusCode::OK);
        let stations = body.as_array().unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0]["name"], "Pop Hits");
        assert_eq!(stations[1]["uuid"], "u1");
        assert_eq!(stations[1]["stream_url"], "http://x/s.mp3");
        assert!(stations[1]["homepage_url"].is_null());
        assert_eq!(stations[1]["country"]["iso_3166_1"], "LU");
        assert_eq!(stations[1]["languages"][0]["iso_639_1"], "fr");
        assert_eq!(stations[1]["tags"][0]["name"], "pop");

        let (_, page2) = get_json(app, "/api/v1/station/all?page=2").await;
        assert!(page2.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_normalizes_params() {
        let (_dir, app) = seeded();
        let (status, body) =
            get_json(app, "/api/v1/station/search?name=Radio&country=lu&tag=POP").await;
        assert_eq!(status, StatusCode::OK);
        let stations = body.as_array().unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0]["name"], "Radio X");
    }

    #[tokio::test]
    async fn test_empty_search_is_bad_request() {
        let (_dir, app) = seeded();
        let (status, _) = get_json(app.clone(), "/api/v1/station/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(app, "/api/v1/station/search?name=&tag=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reference_listings() {
        let (_dir, app) = seeded();
        let (_, countries) = get_json(app.clone(), "/api/v1/station/countries").await;
        assert_eq!(countries[0]["iso_3166_1"], "LU");
        let (_, languages) = get_json(app.clone(), "/api/v1/station/languages").await;
        assert_eq!(languages[0]["iso_639_1"], "fr");
        let (_, tags) = get_json(app, "/api/v1/station/tags").await;
        assert_eq!(tags[0]["name"], "pop");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_each_get_a_connection() {
        let (_dir, app) = seeded();
        let requests = (0..8).map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let uri = if i % 2 == 0 {
                    "/api/v1/station/all"
                } else {
                    "/api/v1/station/search?tag=pop"
                };
                get_json(app, uri).await
            })
        });
        let handles: Vec<_> = requests.collect();

        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body.as_array().unwrap().len(), 2);
        }
    }
}
