//! Index trait definitions for Cairn.
//!
//! This module defines the `Index` contract every index variant satisfies and
//! the forward-only `Cursor` returned by `Index::find`.

use cairn_core::schema::{Column, IndexType};
use cairn_core::{Position, Result, Row, TableId};
use cairn_storage::{Session, UndoOperation};

/// Forward-only iteration over index rows.
pub trait Cursor {
    /// Moves to the next row. Returns false once the end is reached.
    fn advance(&mut self) -> Result<bool>;

    /// Returns the row the cursor is on, if any.
    fn current(&self) -> Option<&Row>;

    /// Drains the remaining rows into a vector.
    fn collect_rows(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while self.advance()? {
            if let Some(row) = self.current() {
                rows.push(row.clone());
            }
        }
        Ok(rows)
    }
}

/// Core trait for all index implementations.
pub trait Index: Send + Sync {
    /// Returns the index id.
    fn id(&self) -> i32;

    /// Returns the id of the indexed table.
    fn table_id(&self) -> TableId;

    /// Returns the index name.
    fn name(&self) -> &str;

    /// Returns the index type.
    fn index_type(&self) -> IndexType;

    /// Adds a row, assigning its position.
    fn add(&mut self, session: &mut Session, row: &mut Row) -> Result<()>;

    /// Removes a row previously added to this index.
    fn remove(&mut self, session: &mut Session, row: &Row) -> Result<()>;

    /// Returns a cursor over the rows between `first` and `last`.
    fn find<'a>(
        &'a self,
        session: &'a Session,
        first: Option<&Row>,
        last: Option<&Row>,
    ) -> Result<Box<dyn Cursor + 'a>>;

    /// Returns the row at `position`.
    fn get_row(&self, session: &Session, position: Position) -> Result<Option<Row>>;

    /// Returns the number of rows visible to `session`.
    fn row_count(&self, session: &Session) -> u64;

    /// Returns the estimated cost of a lookup with the given column masks.
    fn cost(&self, session: &Session, masks: &[u32]) -> f64;

    /// Removes every row.
    fn truncate(&mut self, session: &mut Session) -> Result<()>;

    /// Releases resources held by the index.
    fn close(&mut self, session: &mut Session) -> Result<()>;

    /// Drops the index and everything it stores.
    fn remove_index(&mut self, session: &mut Session) -> Result<()>;

    /// Returns true if the index must be rebuilt after opening.
    fn need_rebuild(&self) -> bool;

    /// Returns true if the first or last row can be found directly.
    fn can_get_first_or_last(&self, first: bool) -> bool;

    /// Returns the first or last row in index order.
    fn find_first_or_last(&self, session: &Session, first: bool) -> Result<Option<Row>>;

    /// Fails if the index cannot be renamed.
    fn check_rename(&self) -> Result<()>;

    /// Returns the position of `column` within the index key.
    fn column_index(&self, column: &Column) -> Option<usize>;

    /// Returns the statement that recreates the index.
    fn create_sql(&self) -> Option<String>;

    /// Finalizes a logged change when its transaction commits.
    fn commit(&mut self, operation: UndoOperation, row: &Row);
}
