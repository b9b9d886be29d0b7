//! External large-object storage.
//!
//! Large values are linked into this store when their row is persisted, and
//! the row then only carries a `(table_id, object_id)` reference.

use cairn_core::{Error, LobPayload, LobValue, Result, TableId};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store for large-object payloads that live outside their rows.
pub trait LobStore: Send + Sync {
    /// Links `lob` into the store on behalf of `table_id`.
    ///
    /// Returns the value unchanged if it is already linked to `table_id`.
    /// A value linked to another table is copied.
    fn link(&self, lob: &LobValue, table_id: TableId) -> Result<LobValue>;

    /// Releases a linked object. Unlinked values are ignored.
    fn unlink(&self, lob: &LobValue) -> Result<()>;

    /// Reads the full payload of a value, linked or inline.
    fn read(&self, lob: &LobValue) -> Result<Vec<u8>>;

    /// Releases every object linked to `table_id`. Returns how many went.
    fn remove_all_for_table(&self, table_id: TableId) -> Result<usize>;
}

/// In-process [`LobStore`] keeping payloads in a map.
#[derive(Debug, Default)]
pub struct MemoryLobStore {
    objects: Mutex<HashMap<(TableId, u64), Vec<u8>>>,
    next_id: AtomicU64,
}

impl MemoryLobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    /// Returns true if the referenced object is stored.
    pub fn contains(&self, lob: &LobValue) -> bool {
        lob.link_key()
            .map(|key| self.objects.lock().contains_key(&key))
            .unwrap_or(false)
    }

    fn insert(&self, lob: &LobValue, table_id: TableId, data: Vec<u8>) -> LobValue {
        let object_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let length = data.len() as u64;
        self.objects.lock().insert((table_id, object_id), data);
        LobValue::linked(lob.kind(), table_id, object_id, length)
    }
}

impl LobStore for MemoryLobStore {
    fn link(&self, lob: &LobValue, table_id: TableId) -> Result<LobValue> {
        match lob.payload() {
            LobPayload::Inline(data) => Ok(self.insert(lob, table_id, data.clone())),
            LobPayload::Linked {
                table_id: owner, ..
            } if *owner == table_id => Ok(lob.clone()),
            LobPayload::Linked { .. } => {
                let data = self.read(lob)?;
                Ok(self.insert(lob, table_id, data))
            }
        }
    }

    fn unlink(&self, lob: &LobValue) -> Result<()> {
        let key = match lob.link_key() {
            Some(key) => key,
            None => return Ok(()),
        };
        match self.objects.lock().remove(&key) {
            Some(_) => Ok(()),
            None => Err(Error::large_object(format!(
                "unlink of unknown object {} in table {}",
                key.1, key.0
            ))),
        }
    }

    fn read(&self, lob: &LobValue) -> Result<Vec<u8>> {
        match lob.payload() {
            LobPayload::Inline(data) => Ok(data.clone()),
            LobPayload::Linked {
                table_id,
                object_id,
                ..
            } => self
                .objects
                .lock()
                .get(&(*table_id, *object_id))
                .cloned()
                .ok_or_else(|| {
                    Error::large_object(format!(
                        "dangling reference to object {} in table {}",
                        object_id, table_id
                    ))
                }),
        }
    }

    fn remove_all_for_table(&self, table_id: TableId) -> Result<usize> {
        let mut objects = self.objects.lock();
        let before = objects.len();
        objects.retain(|(owner, _), _| *owner != table_id);
        Ok(before - objects.len())
    }
}
