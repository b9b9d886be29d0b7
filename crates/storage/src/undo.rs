//! Undo log for tracking row changes within a transaction.
//!
//! The log is written by the transaction layer after each successful add or
//! remove. It is replayed in reverse on rollback, or walked forward on commit
//! to finalize multi-version row counts.
//!
//! A row re-added during rollback may land on a different position than the
//! one it was deleted from. Each delete record therefore remembers the insert
//! record (if any) that placed the deleted row, and [`UndoLog::pop_replayed`]
//! moves that insert record to wherever the row landed.

use cairn_core::{Position, Row, TableId};
use hashbrown::HashMap;

/// The operation an undo record reverses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UndoOperation {
    /// A row was inserted; undoing it removes the row.
    Insert,
    /// A row was deleted; undoing it re-adds the row.
    Delete,
}

/// A single undo log entry.
#[derive(Clone, Debug)]
pub struct UndoLogRecord {
    table_id: TableId,
    operation: UndoOperation,
    row: Row,
    /// For a delete, the log index of the insert that placed the row.
    inserted_by: Option<usize>,
}

impl UndoLogRecord {
    /// Creates a record for an inserted row.
    pub fn insert(table_id: TableId, row: Row) -> Self {
        Self {
            table_id,
            operation: UndoOperation::Insert,
            row,
            inserted_by: None,
        }
    }

    /// Creates a record for a deleted row.
    pub fn delete(table_id: TableId, row: Row) -> Self {
        Self {
            table_id,
            operation: UndoOperation::Delete,
            row,
            inserted_by: None,
        }
    }

    /// Returns the table this record belongs to.
    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the logged operation.
    #[inline]
    pub fn operation(&self) -> UndoOperation {
        self.operation
    }

    /// Returns the logged row.
    #[inline]
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Returns the log index of the insert that placed a deleted row.
    #[inline]
    pub fn inserted_by(&self) -> Option<usize> {
        self.inserted_by
    }

    /// Consumes the record, returning the row.
    pub fn into_row(self) -> Row {
        self.row
    }

    fn key(&self) -> Option<(TableId, Position)> {
        self.row.position().map(|pos| (self.table_id, pos))
    }
}

/// Ordered list of undo records for one session.
#[derive(Debug, Default)]
pub struct UndoLog {
    records: Vec<UndoLogRecord>,
    /// Live rows placed by an insert of this log, by position.
    live_inserts: HashMap<(TableId, Position), usize>,
}

impl UndoLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    ///
    /// A delete of a row inserted earlier in this log is linked to that
    /// insert.
    pub fn push(&mut self, mut record: UndoLogRecord) {
        let index = self.records.len();
        if let Some(key) = record.key() {
            match record.operation {
                UndoOperation::Insert => {
                    self.live_inserts.insert(key, index);
                }
                UndoOperation::Delete => {
                    record.inserted_by = self.live_inserts.remove(&key);
                }
            }
        }
        self.records.push(record);
    }

    /// Returns all records in the order they were logged.
    pub fn records(&self) -> &[UndoLogRecord] {
        &self.records
    }

    /// Returns the newest record.
    pub fn last(&self) -> Option<&UndoLogRecord> {
        self.records.last()
    }

    /// Removes the newest record once it has been undone.
    ///
    /// For a delete, `position` is where the row was re-added. The insert
    /// that placed the row is moved there, so undoing it later removes the
    /// right row.
    pub fn pop_replayed(&mut self, position: Option<Position>) -> Option<UndoLogRecord> {
        let record = self.records.pop()?;
        let index = self.records.len();
        match record.operation {
            UndoOperation::Insert => {
                if let Some(key) = record.key() {
                    if self.live_inserts.get(&key) == Some(&index) {
                        self.live_inserts.remove(&key);
                    }
                }
            }
            UndoOperation::Delete => {
                if let (Some(insert), Some(pos)) = (record.inserted_by, position) {
                    if let Some(inserted) = self.records.get_mut(insert) {
                        inserted.row.set_position(pos);
                        self.live_inserts.insert((record.table_id, pos), insert);
                    }
                }
            }
        }
        Some(record)
    }

    /// Removes and returns all records, leaving the log empty.
    pub fn take(&mut self) -> Vec<UndoLogRecord> {
        self.live_inserts.clear();
        core::mem::take(&mut self.records)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clears the log without replaying it.
    pub fn clear(&mut self) {
        self.live_inserts.clear();
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::Value;

    fn placed(id: i64, position: Position) -> Row {
        let mut row = Row::new(vec![Value::Int64(id)]);
        row.set_position(position);
        row
    }

    #[test]
    fn test_undo_log_push() {
        let mut log = UndoLog::new();
        assert!(log.is_empty());

        log.push(UndoLogRecord::insert(1, Row::new(vec![Value::Int64(1)])));
        log.push(UndoLogRecord::delete(1, Row::new(vec![Value::Int64(2)])));

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].operation(), UndoOperation::Insert);
        assert_eq!(log.records()[1].operation(), UndoOperation::Delete);
        assert_eq!(log.records()[1].table_id(), 1);
    }

    #[test]
    fn test_delete_links_to_insert() {
        let mut log = UndoLog::new();
        log.push(UndoLogRecord::delete(1, placed(0, 0)));
        log.push(UndoLogRecord::insert(1, placed(1, 3)));
        log.push(UndoLogRecord::insert(2, placed(2, 3)));
        log.push(UndoLogRecord::delete(1, placed(1, 3)));

        assert_eq!(log.records()[0].inserted_by(), None);
        assert_eq!(log.records()[3].inserted_by(), Some(1));
    }

    #[test]
    fn test_pop_replayed_moves_insert() {
        let mut log = UndoLog::new();
        log.push(UndoLogRecord::insert(1, placed(1, 3)));
        log.push(UndoLogRecord::delete(1, placed(1, 3)));

        let delete = log.pop_replayed(Some(7)).unwrap();
        assert_eq!(delete.operation(), UndoOperation::Delete);
        assert_eq!(log.last().unwrap().row().position(), Some(7));

        // A second delete of the re-added row links to the moved insert.
        log.push(UndoLogRecord::delete(1, placed(1, 7)));
        assert_eq!(log.last().unwrap().inserted_by(), Some(0));

        log.pop_replayed(Some(3));
        let insert = log.pop_replayed(None).unwrap();
        assert_eq!(insert.row().position(), Some(3));
        assert!(log.is_empty());
    }

    #[test]
    fn test_undo_log_take() {
        let mut log = UndoLog::new();
        log.push(UndoLogRecord::insert(1, placed(1, 0)));

        let records = log.take();
        assert_eq!(records.len(), 1);
        assert!(log.is_empty());
        assert_eq!(
            records.into_iter().next().unwrap().into_row().value(0).unwrap(),
            &Value::Int64(1)
        );

        // The taken insert no longer links new deletes.
        log.push(UndoLogRecord::delete(1, placed(1, 0)));
        assert_eq!(log.last().unwrap().inserted_by(), None);
    }

    #[test]
    fn test_undo_log_clear() {
        let mut log = UndoLog::new();
        log.push(UndoLogRecord::delete(2, Row::new(Vec::new())));
        log.clear();
        assert!(log.is_empty());
        assert!(log.pop_replayed(None).is_none());
    }
}
