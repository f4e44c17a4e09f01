//! Result store
//!
//! Keeps text results in ~/.image-pipeline/results.db so past queries can be
//! looked up later. Writes are best effort: callers turn errors into
//! warnings.

use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::ResultStore;
use crate::error::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document TEXT NOT NULL,
    metadata TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// SQLite-backed document store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// One stored document
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: String,
    pub metadata: HashMap<String, String>,
    pub created_at: String,
}

impl SqliteStore {
    /// Open or create the store at a specific path
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Open(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("Result store opened at {:?}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default location (~/.image-pipeline/results.db)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".image-pipeline").join("results.db"))
    }

    /// Most recent documents first
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredDocument>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT document, metadata, created_at FROM documents ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (document, metadata, created_at) = row?;
            documents.push(StoredDocument {
                document,
                metadata: serde_json::from_str(&metadata)?,
                created_at,
            });
        }
        Ok(documents)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Open("store connection poisoned".into()))
    }
}

impl ResultStore for SqliteStore {
    fn add(&self, document: &str, metadata: &HashMap<String, String>) -> Result<(), StorageError> {
        let metadata = serde_json::to_string(metadata)?;
        let created_at = chrono::Utc::now().to_rfc3339();

        self.lock()?.execute(
            "INSERT INTO documents (document, metadata, created_at) VALUES (?1, ?2, ?3)",
            params![document, metadata, created_at],
        )?;
        Ok(())
    }
}

/// Store that discards everything (`store.enabled = false`)
pub struct NullStore;

impl ResultStore for NullStore {
    fn add(&self, _document: &str, _metadata: &HashMap<String, String>) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Stand-in when the configured store could not be opened; every write
/// reports the original reason
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ResultStore for UnavailableStore {
    fn add(&self, _document: &str, _metadata: &HashMap<String, String>) -> Result<(), StorageError> {
        Err(StorageError::Open(self.reason.clone()))
    }
}
