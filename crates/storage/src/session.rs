//! Session context for the storage core.
//!
//! A session carries its identity, the undo log of its open transaction and
//! the queue of large objects to release when that transaction ends. Indexes
//! only append to the queue. The transaction layer drains it at commit or
//! rollback, so a concurrent reader or a rollback can still resolve a value
//! that was logically deleted.

use crate::undo::{UndoLog, UndoLogRecord};
use cairn_core::{LobValue, SessionId, TableId, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global session id counter. Zero is reserved for "no session".
static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

/// Large objects scheduled for release when the transaction ends, keyed by
/// their link key so the same object is never released twice.
#[derive(Debug, Default)]
pub struct PendingUnlinks {
    entries: BTreeMap<(TableId, u64), LobValue>,
}

impl PendingUnlinks {
    /// Schedules a linked object for release. Unlinked objects are ignored.
    pub fn schedule(&mut self, lob: &LobValue) -> bool {
        match lob.link_key() {
            Some(key) => self.entries.insert(key, lob.clone()).is_none(),
            None => false,
        }
    }

    /// Cancels a scheduled release. Returns true if one was pending.
    pub fn cancel(&mut self, lob: &LobValue) -> bool {
        match lob.link_key() {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// Returns true if the object is scheduled for release.
    pub fn contains(&self, lob: &LobValue) -> bool {
        lob.link_key()
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Returns the number of scheduled releases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every scheduled object.
    pub fn drain(&mut self) -> Vec<LobValue> {
        core::mem::take(&mut self.entries).into_values().collect()
    }
}

/// A database session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    undo_log: UndoLog,
    unlinks: PendingUnlinks,
}

impl Session {
    /// Creates a session with a fresh id.
    pub fn new() -> Self {
        Self::with_id(NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Creates a session with the given id.
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            undo_log: UndoLog::new(),
            unlinks: PendingUnlinks::default(),
        }
    }

    /// Returns the session id.
    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Appends a record to this session's undo log.
    pub fn log(&mut self, record: UndoLogRecord) {
        self.undo_log.push(record);
    }

    /// Returns the undo log.
    pub fn undo_log(&self) -> &UndoLog {
        &self.undo_log
    }

    /// Returns the undo log mutably.
    pub fn undo_log_mut(&mut self) -> &mut UndoLog {
        &mut self.undo_log
    }

    /// Schedules a linked large object for release at transaction end.
    pub fn unlink_at_commit(&mut self, value: &Value) {
        if let Value::Lob(lob) = value {
            self.unlinks.schedule(lob);
        }
    }

    /// Cancels a scheduled release, because the object was linked again
    /// within the same transaction. Returns true if one was pending.
    pub fn unlink_at_commit_stop(&mut self, value: &Value) -> bool {
        match value {
            Value::Lob(lob) => self.unlinks.cancel(lob),
            _ => false,
        }
    }

    /// Returns the scheduled releases.
    pub fn pending_unlinks(&self) -> &PendingUnlinks {
        &self.unlinks
    }

    /// Removes and returns every scheduled release.
    pub fn take_pending_unlinks(&mut self) -> Vec<LobValue> {
        self.unlinks.drain()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::{LobKind, Row};

    fn linked(object_id: u64) -> Value {
        Value::Lob(LobValue::linked(LobKind::Blob, 1, object_id, 10))
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), 0);
        assert_eq!(Session::with_id(42).id(), 42);
    }

    #[test]
    fn test_unlink_at_commit() {
        let mut session = Session::with_id(1);
        session.unlink_at_commit(&linked(5));
        session.unlink_at_commit(&linked(5));
        assert_eq!(session.pending_unlinks().len(), 1);

        let drained = session.take_pending_unlinks();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].link_key(), Some((1, 5)));
        assert!(session.pending_unlinks().is_empty());
    }

    #[test]
    fn test_unlink_ignores_inline_and_scalars() {
        let mut session = Session::with_id(1);
        session.unlink_at_commit(&Value::Lob(LobValue::blob(vec![1, 2])));
        session.unlink_at_commit(&Value::Int32(3));
        assert!(session.pending_unlinks().is_empty());
    }

    #[test]
    fn test_unlink_at_commit_stop_cancels() {
        let mut session = Session::with_id(1);
        session.unlink_at_commit(&linked(5));
        session.unlink_at_commit(&linked(6));
        session.unlink_at_commit_stop(&linked(5));

        let pending = session.pending_unlinks();
        assert_eq!(pending.len(), 1);
        assert!(!pending.contains(&LobValue::linked(LobKind::Blob, 1, 5, 10)));
        assert!(pending.contains(&LobValue::linked(LobKind::Blob, 1, 6, 10)));

        // Stopping an unknown object is a no-op.
        session.unlink_at_commit_stop(&linked(7));
        assert_eq!(session.pending_unlinks().len(), 1);
    }

    #[test]
    fn test_session_log() {
        let mut session = Session::with_id(1);
        session.log(UndoLogRecord::insert(1, Row::new(vec![Value::Int32(1)])));
        assert_eq!(session.undo_log().len(), 1);
        session.undo_log_mut().clear();
        assert!(session.undo_log().is_empty());
    }
}
