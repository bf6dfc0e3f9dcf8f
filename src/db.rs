use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::storage;
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const MIGRATIONS: &str = include_str!("../migrations/001_create_catalog.sql");

/// Owns the SQLite connection behind the catalog.
pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open (or create) the catalog file and bring the schema up to date.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = Path::new(&config.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening catalog database at {}", path.display());

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        // Readers keep seeing the previous generation while a sync is writing
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("Journal mode {}", mode);
        Self::from_connection(conn)
    }

    /// Private in-memory catalog, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn run_migrations(&self) -> Result<()> {
        debug!("Running catalog migrations");
        self.conn.execute_batch(MIGRATIONS)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start the write transaction of a sync run.
    ///
    /// The transaction takes SQLite's write lock immediately, so a second run
    /// waits for the busy timeout and then fails instead of interleaving its
    /// wipe with ours. Dropping the handle without `commit` rolls back.
    pub fn begin_sync(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    pub fn ping(&self) -> Result<()> {
        storage::ping(&self.conn)
    }
}

/// Hands out short-lived connections for the read API.
///
/// Each request gets its own connection, so requests never queue behind one
/// another in this process. Connections are `query_only` and never create the
/// database file; WAL mode lets them read the last committed generation while a
/// sync is writing.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    path: PathBuf,
    busy_timeout: Duration,
}

impl CatalogReader {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read connection. Fails when the catalog file does not exist.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "query_only", true)?;
        Ok(conn)
    }
}
