// ⚙️ Configuration - where the data lives and how lists are paged
//
// Built by the binaries from command-line flags (with environment
// fallbacks); the library itself never reads the environment.

use crate::error::ExpenseError;
use crate::persistence::{FileStorage, KeyValueStore, SqliteStorage};
use crate::query::DEFAULT_PAGE_SIZE;
use crate::store::ExpenseStore;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_DATA_DIR: &str = ".pocketwatch";

/// SQLite file name inside the data directory
pub const DATABASE_FILE: &str = "pocketwatch.db";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per key in the data directory
    #[default]
    Json,
    /// A single SQLite database in the data directory
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Json => f.write_str("json"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            _ => Err(ExpenseError::parse("storage backend", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Rows per page when a list is first shown
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            backend: Backend::Json,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStore>> {
        let storage: Box<dyn KeyValueStore> = match self.backend {
            Backend::Json => Box::new(FileStorage::new(&self.data_dir)),
            Backend::Sqlite => Box::new(SqliteStorage::open(&self.database_path())?),
        };
        info!(backend = %self.backend, data_dir = %self.data_dir.display(), "storage ready");
        Ok(storage)
    }

    /// Storage plus the loaded collection
    pub fn open_store(&self, today: NaiveDate) -> Result<ExpenseStore> {
        Ok(ExpenseStore::open(self.open_storage()?, today))
    }
}
