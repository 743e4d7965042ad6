// ============================================================================
// ShoplistDb - Embedded Key/Value State (redb)
// ============================================================================
// String-keyed local persistence that survives restarts: session identity,
// theme flag, and per-user monthly lists.
// Default path: ~/.shoplist/state.redb (callers pass AppConfig::db_path)
// ============================================================================

pub mod records;

pub use records::{
    clear_active_list, clear_session, load_active_list, load_dark_mode, load_session,
    save_active_list, save_dark_mode, save_session, SessionRecord,
};

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

const STATE: TableDefinition<&str, &str> = TableDefinition::new("state");

/// String key/value persistence
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Write all entries or none
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;
    /// Returns true if the key existed
    fn remove(&self, key: &str) -> Result<bool>;
    /// Remove all keys or none. Returns how many existed.
    fn remove_many(&self, keys: &[&str]) -> Result<usize>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Embedded database for local shopping-list state
pub struct ShoplistDb {
    db: Database,
    path: PathBuf,
}

impl ShoplistDb {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses ~/.shoplist/state.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = match path {
            Some(p) => PathBuf::from(p),
            None => default_db_path()?,
        };

        info!("Opening database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure the table exists by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn
                .open_table(STATE)
                .map_err(|e| anyhow!("Failed to create state table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// ~/.shoplist/state.redb, creating the directory if needed
fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
    let dir = home.join(".shoplist");
    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow!("Failed to create .shoplist directory: {}", e))?;
    Ok(dir.join("state.redb"))
}

impl KeyValueStore for ShoplistDb {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(STATE)
            .map_err(|e| anyhow!("Failed to open state table: {}", e))?;

        let value = table
            .get(key)
            .map_err(|e| anyhow!("Failed to get {}: {}", key, e))?
            .map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(STATE)
                .map_err(|e| anyhow!("Failed to open state table: {}", e))?;
            for (key, value) in entries {
                table.insert(*key, *value)
                    .map_err(|e| anyhow!("Failed to insert {}: {}", key, e))?;
            }
        }
        // Dropping an uncommitted transaction aborts it
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        for (key, _) in entries {
            debug!("Stored {}", key);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.remove_many(&[key])? > 0)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<usize> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let mut removed = 0;
        {
            let mut table = write_txn.open_table(STATE)
                .map_err(|e| anyhow!("Failed to open state table: {}", e))?;
            for key in keys {
                if table.remove(*key)
                    .map_err(|e| anyhow!("Failed to remove {}: {}", key, e))?
                    .is_some()
                {
                    debug!("Deleted {}", key);
                    removed += 1;
                }
            }
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        Ok(removed)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(STATE)
            .map_err(|e| anyhow!("Failed to open state table: {}", e))?;

        let mut keys = Vec::new();
        let iter = table.range::<&str>(..)
            .map_err(|e| anyhow!("Failed to iterate state: {}", e))?;
        for entry in iter {
            let (key, _value) = entry.map_err(|e| anyhow!("Failed to read entry: {}", e))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

/// Volatile store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("Memory store lock poisoned"))?;
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.remove_many(&[key])? > 0)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<usize> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(keys.iter().filter(|key| entries.remove(**key).is_some()).count())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| anyhow!("Memory store lock poisoned"))?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (tempfile::TempDir, ShoplistDb) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        let db = ShoplistDb::open(path.to_str()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, db) = temp_db();
        assert_eq!(db.get("session:user_id").unwrap(), None);

        db.set("session:user_id", "u-1").unwrap();
        assert_eq!(db.get("session:user_id").unwrap().as_deref(), Some("u-1"));

        db.set("session:user_id", "u-2").unwrap();
        assert_eq!(db.get("session:user_id").unwrap().as_deref(), Some("u-2"));

        assert!(db.remove("session:user_id").unwrap());
        assert!(!db.remove("session:user_id").unwrap());
        assert_eq!(db.get("session:user_id").unwrap(), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        {
            let db = ShoplistDb::open(path.to_str()).unwrap();
            db.set("settings:dark_mode", "true").unwrap();
        }
        let db = ShoplistDb::open(path.to_str()).unwrap();
        assert_eq!(db.get("settings:dark_mode").unwrap().as_deref(), Some("true"));
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_batch_write_and_remove() {
        let (_dir, db) = temp_db();
        db.set_many(&[("monthly_list:u-1", "{}"), ("reference_month:u-1", "March/2024")])
            .unwrap();
        assert_eq!(db.get("monthly_list:u-1").unwrap().as_deref(), Some("{}"));
        assert_eq!(db.get("reference_month:u-1").unwrap().as_deref(), Some("March/2024"));

        assert_eq!(
            db.remove_many(&["monthly_list:u-1", "reference_month:u-1", "absent"]).unwrap(),
            2
        );
        assert!(db.keys().unwrap().is_empty());
    }

    #[test]
    fn test_keys_listed() {
        let (_dir, db) = temp_db();
        db.set("b", "2").unwrap();
        db.set("a", "1").unwrap();
        assert_eq!(db.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
        assert!(store.remove("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }
}
