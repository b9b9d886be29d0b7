//! Row structure for the Cairn row store.
//!
//! This module defines the `Row` struct, the unit of storage and transfer
//! between the table layer, the scan index and the record store.

use crate::error::{Error, Result};
use crate::types::{Position, SessionId};
use crate::value::Value;
use core::fmt;

/// Size in bytes of a storage block. Used for memory accounting only.
pub const BLOCK_SIZE: u32 = 128;

/// A row in a database table.
///
/// The number of values is fixed at construction. The position is assigned
/// by the owning index or record store when the row is first added.
#[derive(Clone, Debug)]
pub struct Row {
    /// Values stored in this row, indexed by column position.
    values: Vec<Value>,
    /// Slot index (in-memory) or record position (persistent).
    position: Option<Position>,
    deleted: bool,
    /// Session that last inserted or deleted this row (multi-version only).
    session_id: SessionId,
    /// Estimated value weight, in 4-byte units.
    memory: u32,
    /// Number of storage blocks the encoded row occupies.
    block_count: u32,
}

impl Row {
    /// Creates a new row, estimating its memory weight from the values.
    pub fn new(values: Vec<Value>) -> Self {
        let memory = values
            .iter()
            .map(Value::memory)
            .fold(saturating_u32(values.len()), u32::saturating_add);
        Self::with_memory(values, memory)
    }

    /// Creates a new row with an explicit memory weight.
    pub fn with_memory(values: Vec<Value>, memory: u32) -> Self {
        Self {
            values,
            position: None,
            deleted: false,
            session_id: 0,
            memory,
            block_count: 0,
        }
    }

    /// Returns the value at the given column index.
    pub fn value(&self, index: usize) -> Result<&Value> {
        self.values
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, self.values.len()))
    }

    /// Replaces the value at the given column index.
    pub fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        let arity = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::out_of_range(index, arity)),
        }
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the position, if the row has been added to an index.
    #[inline]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Sets the position.
    #[inline]
    pub fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Returns whether the row is marked deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Marks the row deleted or live.
    #[inline]
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Returns the owning session id.
    #[inline]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Sets the owning session id.
    #[inline]
    pub fn set_session_id(&mut self, session_id: SessionId) {
        self.session_id = session_id;
    }

    /// Returns the number of storage blocks.
    #[inline]
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Sets the number of storage blocks.
    #[inline]
    pub fn set_block_count(&mut self, block_count: u32) {
        self.block_count = block_count;
    }

    /// Estimated memory footprint, for cache accounting.
    pub fn memory_size(&self) -> u32 {
        self.block_count
            .saturating_mul(BLOCK_SIZE / 16)
            .saturating_add(self.memory.saturating_mul(4))
    }
}

/// Converts a length to `u32`, clamping at `u32::MAX`.
#[inline]
pub(crate) fn saturating_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.values == other.values
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")")?;
        match self.position {
            Some(pos) => write!(f, " /* pos: {} */", pos)?,
            None => f.write_str(" /* pos: none */")?,
        }
        if self.deleted {
            f.write_str(" /* deleted */")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_new() {
        let row = Row::new(vec![Value::Int64(42), Value::String("Alice".into())]);
        assert_eq!(row.column_count(), 2);
        assert_eq!(row.position(), None);
        assert!(!row.is_deleted());
        assert_eq!(row.session_id(), 0);
    }

    #[test]
    fn test_row_get_value() {
        let row = Row::new(vec![Value::Int64(1), Value::String("Alice".into())]);
        assert_eq!(row.value(0).unwrap(), &Value::Int64(1));
        assert_eq!(row.value(1).unwrap(), &Value::String("Alice".into()));
        assert!(matches!(
            row.value(2),
            Err(Error::OutOfRange { index: 2, arity: 2 })
        ));
    }

    #[test]
    fn test_row_set_value() {
        let mut row = Row::new(vec![Value::Int64(1), Value::String("Alice".into())]);
        row.set_value(0, Value::Int64(100)).unwrap();
        assert_eq!(row.value(0).unwrap(), &Value::Int64(100));
        assert!(matches!(
            row.set_value(10, Value::Int64(999)),
            Err(Error::OutOfRange { index: 10, arity: 2 })
        ));
        assert_eq!(row.column_count(), 2);
    }

    #[test]
    fn test_row_is_empty() {
        assert!(Row::new(Vec::new()).is_empty());
        assert!(!Row::new(vec![Value::Null]).is_empty());
    }

    #[test]
    fn test_row_memory_size() {
        let mut row = Row::with_memory(vec![Value::Int32(1)], 10);
        assert_eq!(row.memory_size(), 40);
        row.set_block_count(2);
        assert_eq!(row.memory_size(), 2 * (BLOCK_SIZE / 16) + 40);
    }

    #[test]
    fn test_row_memory_saturates() {
        let mut row = Row::with_memory(Vec::new(), u32::MAX);
        row.set_block_count(u32::MAX);
        assert_eq!(row.memory_size(), u32::MAX);
        assert_eq!(saturating_u32(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_row_equality() {
        let mut row1 = Row::new(vec![Value::Int32(42)]);
        let mut row2 = Row::new(vec![Value::Int32(42)]);
        row1.set_position(1);
        row2.set_position(1);
        assert_eq!(row1, row2);
        row2.set_position(2);
        assert_ne!(row1, row2);
    }

    #[test]
    fn test_row_display() {
        let mut row = Row::new(vec![Value::Int32(1), Value::String("a".into())]);
        row.set_position(7);
        assert_eq!(row.to_string(), "(1, 'a') /* pos: 7 */");
        row.set_deleted(true);
        assert_eq!(row.to_string(), "(1, 'a') /* pos: 7 */ /* deleted */");
    }
}
