//! In-memory scan over an arena of row slots.

use super::cursor::{RowSource, ScanCursor};
use super::{scan_name, COST_ROW_OFFSET};
use crate::row_count::RowCount;
use crate::traits::{Cursor, Index};
use cairn_core::schema::{Column, IndexType, Table};
use cairn_core::{Error, Position, Result, Row, TableId};
use cairn_storage::{Session, UndoOperation};

/// One arena slot.
#[derive(Clone, Debug)]
enum Slot {
    Occupied(Row),
    /// A reusable slot, linked to the next free one.
    Free { next: Option<usize> },
}

/// Scan index keeping rows in memory.
///
/// Removed slots form a LIFO free list and are reused by later adds, so a
/// row's position is its slot number.
#[derive(Debug)]
pub struct TransientScan {
    table_id: TableId,
    name: String,
    slots: Vec<Slot>,
    first_free: Option<usize>,
    count: RowCount,
}

impl TransientScan {
    /// Creates an empty in-memory scan for `table`.
    pub fn new(table: &Table, multi_version: bool) -> Self {
        Self {
            table_id: table.id(),
            name: scan_name(table),
            slots: Vec::new(),
            first_free: None,
            count: RowCount::new(0, multi_version),
        }
    }

    /// Returns the row count bookkeeping.
    pub fn counts(&self) -> &RowCount {
        &self.count
    }

    /// Returns the head of the free list.
    pub fn first_free(&self) -> Option<usize> {
        self.first_free
    }

    /// Returns the number of slots, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn allocate(&mut self) -> Result<usize> {
        match self.first_free {
            Some(slot) => match self.slots.get(slot) {
                Some(Slot::Free { next }) => {
                    self.first_free = *next;
                    Ok(slot)
                }
                _ => Err(Error::corrupted(format!(
                    "free list of {} points at live slot {}",
                    self.name, slot
                ))),
            },
            None => {
                self.slots.push(Slot::Free { next: None });
                Ok(self.slots.len() - 1)
            }
        }
    }
}

fn slot_of(row: &Row) -> Result<usize> {
    let position = row
        .position()
        .ok_or_else(|| Error::invalid_operation("row has no position"))?;
    usize::try_from(position).map_err(|_| Error::record_not_found(position))
}

impl RowSource for TransientScan {
    fn next_row(&self, _session: &Session, after: Option<Position>) -> Result<Option<Row>> {
        let start = match after {
            Some(pos) => match usize::try_from(pos) {
                Ok(pos) => pos + 1,
                Err(_) => return Ok(None),
            },
            None => 0,
        };
        Ok(self.slots.iter().skip(start).find_map(|slot| match slot {
            Slot::Occupied(row) => Some(row.clone()),
            Slot::Free { .. } => None,
        }))
    }
}

impl Index for TransientScan {
    #[inline]
    fn id(&self) -> i32 {
        self.table_id
    }

    #[inline]
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn index_type(&self) -> IndexType {
        IndexType::scan(false)
    }

    fn add(&mut self, session: &mut Session, row: &mut Row) -> Result<()> {
        if self.count.is_multi_version() {
            row.set_session_id(session.id());
        }
        let slot = self.allocate()?;
        row.set_position(slot as Position);
        self.slots[slot] = Slot::Occupied(row.clone());
        self.count.added(session.id());
        Ok(())
    }

    fn remove(&mut self, session: &mut Session, row: &Row) -> Result<()> {
        let slot = slot_of(row)?;
        match self.slots.get(slot) {
            Some(Slot::Occupied(_)) => {}
            _ => return Err(Error::record_not_found(slot as Position)),
        }
        self.slots[slot] = Slot::Free {
            next: self.first_free,
        };
        self.first_free = Some(slot);
        self.count.removed(session.id());
        Ok(())
    }

    fn find<'a>(
        &'a self,
        session: &'a Session,
        _first: Option<&Row>,
        _last: Option<&Row>,
    ) -> Result<Box<dyn Cursor + 'a>> {
        Ok(Box::new(ScanCursor::new(self, session)))
    }

    fn get_row(&self, _session: &Session, position: Position) -> Result<Option<Row>> {
        let slot = usize::try_from(position).ok().and_then(|p| self.slots.get(p));
        Ok(match slot {
            Some(Slot::Occupied(row)) => Some(row.clone()),
            _ => None,
        })
    }

    fn row_count(&self, session: &Session) -> u64 {
        self.count.visible(session.id())
    }

    fn cost(&self, session: &Session, _masks: &[u32]) -> f64 {
        (self.row_count(session) + COST_ROW_OFFSET) as f64
    }

    fn truncate(&mut self, _session: &mut Session) -> Result<()> {
        self.slots.clear();
        self.first_free = None;
        self.count.clear();
        tracing::debug!("truncate {}", self.name);
        Ok(())
    }

    fn close(&mut self, _session: &mut Session) -> Result<()> {
        Ok(())
    }

    fn remove_index(&mut self, session: &mut Session) -> Result<()> {
        self.truncate(session)?;
        tracing::debug!("drop {}", self.name);
        Ok(())
    }

    fn need_rebuild(&self) -> bool {
        false
    }

    fn can_get_first_or_last(&self, _first: bool) -> bool {
        false
    }

    fn find_first_or_last(&self, _session: &Session, _first: bool) -> Result<Option<Row>> {
        Err(Error::unsupported(format!("first or last of {}", self.name)))
    }

    fn check_rename(&self) -> Result<()> {
        Err(Error::unsupported(format!("rename of {}", self.name)))
    }

    fn column_index(&self, _column: &Column) -> Option<usize> {
        None
    }

    fn create_sql(&self) -> Option<String> {
        None
    }

    fn commit(&mut self, operation: UndoOperation, row: &Row) {
        self.count.commit(operation, row);
    }
}
