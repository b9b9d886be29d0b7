//! Table-scan index.
//!
//! Every table has one scan index holding its rows in no particular order.
//! The variant is picked once when the index is opened: tables of an
//! in-memory database, non-persistent tables and tables with a negative id
//! use [`TransientScan`], everything else a [`PersistentScan`].

mod cursor;
mod persistent;
mod transient;

pub use cursor::ScanCursor;
pub use persistent::PersistentScan;
pub use transient::TransientScan;

use crate::traits::{Cursor, Index};
use cairn_core::schema::{Column, IndexType, Table};
use cairn_core::{Position, Result, Row, TableId};
use cairn_storage::{Database, Session, UndoOperation};

/// Added to the row count when estimating scan cost.
pub const COST_ROW_OFFSET: u64 = 1000;

/// Cost multiplier for scans over durable storage.
pub const PERSISTENT_COST_FACTOR: u64 = 10;

pub(crate) fn scan_name(table: &Table) -> String {
    format!("{}_TABLE_SCAN", table.name())
}

/// Scan index of a table.
#[derive(Debug)]
pub enum ScanIndex {
    /// Rows kept in memory.
    Transient(TransientScan),
    /// Rows kept in a record store.
    Persistent(PersistentScan),
}

impl ScanIndex {
    /// Opens the scan index of `table`.
    pub fn open(database: &Database, table: &Table) -> Result<Self> {
        if !database.is_persistent() || !table.is_persistent() || table.id() < 0 {
            Ok(ScanIndex::Transient(TransientScan::new(
                table,
                database.is_multi_version(),
            )))
        } else {
            PersistentScan::open(database, table).map(ScanIndex::Persistent)
        }
    }

    /// Returns true for the store-backed variant.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        matches!(self, ScanIndex::Persistent(_))
    }

    fn inner(&self) -> &dyn Index {
        match self {
            ScanIndex::Transient(scan) => scan,
            ScanIndex::Persistent(scan) => scan,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Index {
        match self {
            ScanIndex::Transient(scan) => scan,
            ScanIndex::Persistent(scan) => scan,
        }
    }
}

impl Index for ScanIndex {
    fn id(&self) -> i32 {
        self.inner().id()
    }

    fn table_id(&self) -> TableId {
        self.inner().table_id()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn index_type(&self) -> IndexType {
        self.inner().index_type()
    }

    fn add(&mut self, session: &mut Session, row: &mut Row) -> Result<()> {
        self.inner_mut().add(session, row)
    }

    fn remove(&mut self, session: &mut Session, row: &Row) -> Result<()> {
        self.inner_mut().remove(session, row)
    }

    fn find<'a>(
        &'a self,
        session: &'a Session,
        first: Option<&Row>,
        last: Option<&Row>,
    ) -> Result<Box<dyn Cursor + 'a>> {
        self.inner().find(session, first, last)
    }

    fn get_row(&self, session: &Session, position: Position) -> Result<Option<Row>> {
        self.inner().get_row(session, position)
    }

    fn row_count(&self, session: &Session) -> u64 {
        self.inner().row_count(session)
    }

    fn cost(&self, session: &Session, masks: &[u32]) -> f64 {
        self.inner().cost(session, masks)
    }

    fn truncate(&mut self, session: &mut Session) -> Result<()> {
        self.inner_mut().truncate(session)
    }

    fn close(&mut self, session: &mut Session) -> Result<()> {
        self.inner_mut().close(session)
    }

    fn remove_index(&mut self, session: &mut Session) -> Result<()> {
        self.inner_mut().remove_index(session)
    }

    fn need_rebuild(&self) -> bool {
        self.inner().need_rebuild()
    }

    fn can_get_first_or_last(&self, first: bool) -> bool {
        self.inner().can_get_first_or_last(first)
    }

    fn find_first_or_last(&self, session: &Session, first: bool) -> Result<Option<Row>> {
        self.inner().find_first_or_last(session, first)
    }

    fn check_rename(&self) -> Result<()> {
        self.inner().check_rename()
    }

    fn column_index(&self, column: &Column) -> Option<usize> {
        self.inner().column_index(column)
    }

    fn create_sql(&self) -> Option<String> {
        self.inner().create_sql()
    }

    fn commit(&mut self, operation: UndoOperation, row: &Row) {
        self.inner_mut().commit(operation, row)
    }
}
