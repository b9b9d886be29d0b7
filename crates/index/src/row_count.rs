//! Row counting for indexes, with optional per-session views.
//!
//! With multi-version tracking each session accumulates a signed delta of its
//! own uncommitted adds and removes. A session's view is the global total,
//! plus its own delta, minus the sum of every delta still outstanding.

use cairn_core::{Row, SessionId};
use cairn_storage::UndoOperation;
use hashbrown::HashMap;

/// Outstanding per-session adjustments.
#[derive(Clone, Debug, Default)]
pub struct SessionDeltas {
    deltas: HashMap<SessionId, i64>,
    /// Sum of all entries in `deltas`.
    diff: i64,
}

impl SessionDeltas {
    /// Creates an empty delta map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `delta` to a session. Entries returning to zero are dropped.
    pub fn increment(&mut self, session_id: SessionId, delta: i64) {
        let entry = self.deltas.entry(session_id).or_insert(0);
        *entry += delta;
        if *entry == 0 {
            self.deltas.remove(&session_id);
        }
        self.diff += delta;
    }

    /// Returns the outstanding delta of a session.
    #[inline]
    pub fn get(&self, session_id: SessionId) -> i64 {
        self.deltas.get(&session_id).copied().unwrap_or(0)
    }

    /// Returns the sum of all outstanding deltas.
    #[inline]
    pub fn diff(&self) -> i64 {
        self.diff
    }

    /// Returns the number of sessions with an outstanding delta.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Returns true if no session has an outstanding delta.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Drops every delta.
    pub fn clear(&mut self) {
        self.deltas.clear();
        self.diff = 0;
    }
}

/// Row count of one index.
#[derive(Clone, Debug)]
pub struct RowCount {
    total: u64,
    deltas: Option<SessionDeltas>,
}

impl RowCount {
    /// Creates a counter starting at `total`. Session deltas are only kept
    /// when `multi_version` is set.
    pub fn new(total: u64, multi_version: bool) -> Self {
        Self {
            total,
            deltas: multi_version.then(SessionDeltas::new),
        }
    }

    /// Returns the global row count.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns true if per-session deltas are tracked.
    #[inline]
    pub fn is_multi_version(&self) -> bool {
        self.deltas.is_some()
    }

    /// Returns the session deltas, if tracked.
    pub fn deltas(&self) -> Option<&SessionDeltas> {
        self.deltas.as_ref()
    }

    /// Records a row added by `session_id`.
    pub fn added(&mut self, session_id: SessionId) {
        self.total += 1;
        self.increment(session_id, 1);
    }

    /// Records a row removed by `session_id`.
    pub fn removed(&mut self, session_id: SessionId) {
        self.total = self.total.saturating_sub(1);
        self.increment(session_id, -1);
    }

    fn increment(&mut self, session_id: SessionId, delta: i64) {
        if let Some(deltas) = self.deltas.as_mut() {
            deltas.increment(session_id, delta);
        }
    }

    /// Returns the number of rows visible to `session_id`.
    pub fn visible(&self, session_id: SessionId) -> u64 {
        match &self.deltas {
            None => self.total,
            Some(deltas) => {
                let count = self.total as i64 + deltas.get(session_id) - deltas.diff();
                count.max(0) as u64
            }
        }
    }

    /// Finalizes a logged change of `row`'s session.
    ///
    /// A committed delete adds one to that session's delta, anything else
    /// subtracts one. The global total is unchanged.
    pub fn commit(&mut self, operation: UndoOperation, row: &Row) {
        let delta = match operation {
            UndoOperation::Delete => 1,
            _ => -1,
        };
        self.increment(row.session_id(), delta);
    }

    /// Resets the total and every session delta.
    pub fn clear(&mut self) {
        self.total = 0;
        if let Some(deltas) = self.deltas.as_mut() {
            deltas.clear();
        }
    }
}

impl Default for RowCount {
    fn default() -> Self {
        Self::new(0, false)
    }
}
