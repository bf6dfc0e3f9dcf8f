use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Export download failed with status {status}")]
    Fetch { status: u16 },

    #[error("Export transport error: {0}")]
    Transport(String),

    #[error("Export decompression failed: {0}")]
    Decompress(std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Catalog integrity error: {0}")]
    Integrity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("At least one search parameter is required")]
    EmptySearch,
}

pub type Result<T> = std::result::Result<T, CatalogError>;
