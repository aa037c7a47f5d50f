// 🗄️ Persistence - the expense collection in a key-value byte store
//
// The whole collection is one JSON array under a single fixed key.
// Backends only move bytes; the shape lives here.
//
// Loading never fails the session: missing, unreadable or malformed data
// all mean "no data yet".

use crate::entities::Expense;
use crate::validation::validate_expense;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Key the collection is stored under
pub const EXPENSES_KEY: &str = "expenses";

/// Opaque byte storage addressed by string keys
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Clones share the same map, so a test can keep a handle and inspect
/// what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

// ============================================================================
// FILE BACKEND
// ============================================================================

/// One `<key>.json` file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(bytes))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory {}", self.dir.display()))?;

        // Write beside the target then rename, so a crash never leaves half a file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStorage { conn })
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value BLOB NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Load the collection; anything unusable yields an empty one.
///
/// Individual records that break the record rules (negative or non-finite
/// amount, blank description, date after `today`) are dropped with a warning
/// and the rest are kept. Records with an id already seen are dropped too
/// (first one wins).
pub fn load_expenses(storage: &dyn KeyValueStore, today: NaiveDate) -> Vec<Expense> {
    let bytes = match storage.get(EXPENSES_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!("no saved expenses, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = ?e, "could not read saved expenses, starting empty");
            return Vec::new();
        }
    };

    let expenses: Vec<Expense> = match serde_json::from_slice(&bytes) {
        Ok(expenses) => expenses,
        Err(e) => {
            warn!(error = %e, "saved expenses are malformed, starting empty");
            return Vec::new();
        }
    };

    let total = expenses.len();
    let valid: Vec<Expense> = expenses
        .into_iter()
        .filter(|e| match validate_expense(e, today) {
            Ok(()) => true,
            Err(err) => {
                warn!(id = %e.id, error = %err, "dropped invalid saved expense");
                false
            }
        })
        .collect();

    let mut seen = HashSet::new();
    let unique: Vec<Expense> = valid
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();

    if unique.len() != total {
        warn!(dropped = total - unique.len(), "dropped unusable saved expenses");
    }

    debug!(count = unique.len(), "loaded expenses");
    unique
}

pub fn save_expenses(storage: &dyn KeyValueStore, expenses: &[Expense]) -> Result<()> {
    let json = serde_json::to_vec(expenses).context("Failed to serialize expenses")?;
    storage
        .set(EXPENSES_KEY, &json)
        .context("Failed to save expenses")?;
    debug!(count = expenses.len(), bytes = json.len(), "saved expenses");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
