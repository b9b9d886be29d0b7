//! Durable record storage for persistent tables.
//!
//! A record store maps positions to encoded rows. Positions are stable for
//! the lifetime of a record and are reused once the record is removed.

use crate::session::Session;
use cairn_core::{Error, Position, Result, Row, BLOCK_SIZE};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Where a new record should be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Allocation {
    /// Let the store pick a position.
    Any,
    /// Place the record at this exact position.
    At(Position),
}

/// Store that persists encoded rows by position.
pub trait RecordStore: Send + Sync {
    /// Writes `row`, assigning its position and block count.
    fn add_record(&self, session: &Session, row: &mut Row, allocation: Allocation)
        -> Result<Position>;

    /// Reads the row stored at `position`.
    fn get_record(&self, session: &Session, position: Position) -> Result<Row>;

    /// Removes the row stored at `position`.
    fn remove_record(&self, session: &Session, position: Position) -> Result<()>;

    /// Returns the number of stored rows.
    fn record_count(&self) -> u64;

    /// Returns the first occupied position strictly after `after`, or the
    /// first occupied position overall when `after` is `None`.
    fn next_position(&self, after: Option<Position>) -> Result<Option<Position>>;

    /// Removes every row.
    fn truncate(&self, session: &Session) -> Result<()>;

    /// Removes every row and releases the store. Later calls fail.
    fn delete(&self, session: &Session) -> Result<()>;
}

#[derive(Debug, Default)]
struct Records {
    data: BTreeMap<Position, Vec<u8>>,
    free: BTreeSet<Position>,
    next: Position,
    deleted: bool,
}

impl Records {
    fn check_open(&self) -> Result<()> {
        if self.deleted {
            Err(Error::storage("record store deleted"))
        } else {
            Ok(())
        }
    }

    fn allocate(&mut self, allocation: Allocation) -> Result<Position> {
        match allocation {
            Allocation::Any => match self.free.pop_first() {
                Some(pos) => Ok(pos),
                None => {
                    let pos = self.next;
                    self.next += 1;
                    Ok(pos)
                }
            },
            Allocation::At(pos) => {
                if self.data.contains_key(&pos) {
                    return Err(Error::storage(format!("position {} is occupied", pos)));
                }
                if pos >= self.next {
                    self.free.extend(self.next..pos);
                    self.next = pos + 1;
                } else {
                    self.free.remove(&pos);
                }
                Ok(pos)
            }
        }
    }
}

/// In-process [`RecordStore`] holding encoded rows in a sorted map.
///
/// The lowest free position is reused first.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Records>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`RecordStore::delete`] has been called.
    pub fn is_deleted(&self) -> bool {
        self.records.lock().deleted
    }
}

fn block_count(bytes: usize) -> u32 {
    let block = BLOCK_SIZE as usize;
    u32::try_from((bytes + block - 1) / block).unwrap_or(u32::MAX)
}

impl RecordStore for MemoryRecordStore {
    fn add_record(
        &self,
        _session: &Session,
        row: &mut Row,
        allocation: Allocation,
    ) -> Result<Position> {
        let mut records = self.records.lock();
        records.check_open()?;
        let position = records.allocate(allocation)?;
        let bytes = row.encode()?;
        row.set_position(position);
        row.set_block_count(block_count(bytes.len()));
        records.data.insert(position, bytes);
        Ok(position)
    }

    fn get_record(&self, _session: &Session, position: Position) -> Result<Row> {
        let records = self.records.lock();
        records.check_open()?;
        let bytes = records
            .data
            .get(&position)
            .ok_or_else(|| Error::record_not_found(position))?;
        let mut row = Row::decode(bytes)?;
        row.set_position(position);
        row.set_block_count(block_count(bytes.len()));
        Ok(row)
    }

    fn remove_record(&self, _session: &Session, position: Position) -> Result<()> {
        let mut records = self.records.lock();
        records.check_open()?;
        if records.data.remove(&position).is_none() {
            return Err(Error::record_not_found(position));
        }
        records.free.insert(position);
        Ok(())
    }

    fn record_count(&self) -> u64 {
        self.records.lock().data.len() as u64
    }

    fn next_position(&self, after: Option<Position>) -> Result<Option<Position>> {
        let records = self.records.lock();
        records.check_open()?;
        let lower = match after {
            Some(pos) => Bound::Excluded(pos),
            None => Bound::Unbounded,
        };
        Ok(records
            .data
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(pos, _)| *pos))
    }

    fn truncate(&self, _session: &Session) -> Result<()> {
        let mut records = self.records.lock();
        records.check_open()?;
        records.data.clear();
        records.free.clear();
        records.next = 0;
        Ok(())
    }

    fn delete(&self, _session: &Session) -> Result<()> {
        let mut records = self.records.lock();
        records.check_open()?;
        *records = Records {
            deleted: true,
            ..Records::default()
        };
        Ok(())
    }
}
