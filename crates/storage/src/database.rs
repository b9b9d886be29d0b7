//! Database handle shared by the indexes of every table.
//!
//! The database owns the configuration, the large-object store and the
//! registry of record stores keyed by `(table_id, index_id)`.

use crate::config::DatabaseConfig;
use crate::lob::{LobStore, MemoryLobStore};
use crate::record_store::{MemoryRecordStore, RecordStore};
use cairn_core::schema::Table;
use cairn_core::{Error, Result, TableId};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;

type StoreKey = (TableId, i32);

/// Database instance.
pub struct Database {
    config: DatabaseConfig,
    lobs: Arc<dyn LobStore>,
    stores: Mutex<HashMap<StoreKey, Arc<dyn RecordStore>>>,
}

impl Database {
    /// Opens a database with an in-process large-object store.
    pub fn open(config: DatabaseConfig) -> Self {
        Self::with_lob_store(config, Arc::new(MemoryLobStore::new()))
    }

    /// Opens a database backed by the given large-object store.
    pub fn with_lob_store(config: DatabaseConfig, lobs: Arc<dyn LobStore>) -> Self {
        tracing::debug!(
            "open database {} (persistent: {}, multi-version: {})",
            config.name,
            config.persistent,
            config.multi_version
        );
        Self {
            config,
            lobs,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns true if tables may use durable record storage.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.config.persistent
    }

    /// Returns true if per-session row counts are tracked.
    #[inline]
    pub fn is_multi_version(&self) -> bool {
        self.config.multi_version
    }

    /// Returns the large-object store.
    pub fn lob_store(&self) -> Arc<dyn LobStore> {
        Arc::clone(&self.lobs)
    }

    /// Returns the record store for an index of `table`.
    ///
    /// A missing store is created when `create` is set, otherwise it is an
    /// error.
    pub fn storage(&self, table: &Table, index_id: i32, create: bool) -> Result<Arc<dyn RecordStore>> {
        let key = (table.id(), index_id);
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(&key) {
            return Ok(Arc::clone(store));
        }
        if !create {
            return Err(Error::storage(format!(
                "no record store for {} index {}",
                table.name(),
                index_id
            )));
        }
        tracing::debug!("create record store for {} index {}", table.name(), index_id);
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        stores.insert(key, Arc::clone(&store));
        Ok(store)
    }

    /// Installs a record store for an index, replacing any existing one.
    pub fn register_storage(&self, table_id: TableId, index_id: i32, store: Arc<dyn RecordStore>) {
        self.stores.lock().insert((table_id, index_id), store);
    }

    /// Detaches the record store of an index. Returns it if one was present.
    pub fn remove_storage(&self, table_id: TableId, index_id: i32) -> Option<Arc<dyn RecordStore>> {
        let removed = self.stores.lock().remove(&(table_id, index_id));
        if removed.is_some() {
            tracing::debug!("remove record store for table {} index {}", table_id, index_id);
        }
        removed
    }

    /// Returns the number of registered record stores.
    pub fn storage_count(&self) -> usize {
        self.stores.lock().len()
    }
}

impl core::fmt::Debug for Database {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("stores", &self.storage_count())
            .finish()
    }
}
