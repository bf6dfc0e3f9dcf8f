pub mod app;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod search;
pub mod server;
pub mod storage;

pub use error::{CatalogError, Result};
