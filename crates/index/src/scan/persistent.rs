//! Scan over a durable record store.

use super::cursor::{RowSource, ScanCursor};
use super::{scan_name, COST_ROW_OFFSET, PERSISTENT_COST_FACTOR};
use crate::row_count::RowCount;
use crate::traits::{Cursor, Index};
use cairn_core::schema::{Column, IndexType, Table};
use cairn_core::{Error, LobValue, Position, Result, Row, TableId, Value};
use cairn_storage::{Allocation, Database, LobStore, RecordStore, Session, UndoOperation};
use std::sync::Arc;

/// Scan index bound to a [`RecordStore`].
///
/// Large-object values are linked into the database's [`LobStore`] on add.
/// On remove their release is deferred to the end of the transaction.
pub struct PersistentScan {
    table_id: TableId,
    name: String,
    table_persistent: bool,
    contains_large_object: bool,
    store: Option<Arc<dyn RecordStore>>,
    lobs: Arc<dyn LobStore>,
    count: RowCount,
}

impl PersistentScan {
    /// Binds a scan of `table` to its record store, creating the store if
    /// needed. The row count starts at the store's record count.
    pub fn open(database: &Database, table: &Table) -> Result<Self> {
        let store = database.storage(table, table.id(), true)?;
        let rows = store.record_count();
        tracing::info!("open existing {} rows: {}", table.name(), rows);
        Ok(Self {
            table_id: table.id(),
            name: scan_name(table),
            table_persistent: table.is_persistent(),
            contains_large_object: table.contains_large_object(),
            store: Some(store),
            lobs: database.lob_store(),
            count: RowCount::new(rows, database.is_multi_version()),
        })
    }

    /// Returns the row count bookkeeping.
    pub fn counts(&self) -> &RowCount {
        &self.count
    }

    /// Returns true if any column holds large objects.
    #[inline]
    pub fn contains_large_object(&self) -> bool {
        self.contains_large_object
    }

    /// Returns true until the index is closed or dropped.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<Arc<dyn RecordStore>> {
        self.store
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| Error::invalid_operation("index closed"))
    }

    /// Links every large object of `row` to this table.
    ///
    /// On failure the links made so far are undone before the error is
    /// returned.
    fn link_large_objects(&self, session: &mut Session, row: &mut Row) -> Result<Vec<LinkedLob>> {
        let mut linked = Vec::new();
        for column in 0..row.column_count() {
            let original = match row.value(column)? {
                Value::Lob(lob) => lob.clone(),
                _ => continue,
            };
            let lob = match self.lobs.link(&original, self.table_id) {
                Ok(lob) => lob,
                Err(err) => {
                    self.unlink_large_objects(session, row, linked);
                    return Err(err);
                }
            };
            let value = Value::Lob(lob.clone());
            let resumed = session.unlink_at_commit_stop(&value);
            if lob != original {
                row.set_value(column, value)?;
            }
            linked.push(LinkedLob {
                column,
                original,
                lob,
                resumed,
            });
        }
        Ok(linked)
    }

    /// Reverts the links of an add that did not complete. Objects created by
    /// the add are released, cancelled releases are queued again and the row
    /// gets its original values back.
    fn unlink_large_objects(&self, session: &mut Session, row: &mut Row, linked: Vec<LinkedLob>) {
        for link in linked.into_iter().rev() {
            if link.resumed {
                session.unlink_at_commit(&Value::Lob(link.lob));
            } else if link.lob != link.original {
                if let Err(err) = self.lobs.unlink(&link.lob) {
                    let value = Value::Lob(link.lob);
                    tracing::warn!("{}: release of {} failed: {}", self.name, value, err);
                    session.unlink_at_commit(&value);
                }
            }
            let _ = row.set_value(link.column, Value::Lob(link.original));
        }
    }
}

/// A large object linked by an add, kept until the record is stored.
struct LinkedLob {
    column: usize,
    original: LobValue,
    lob: LobValue,
    /// A queued release of `lob` was cancelled by the link.
    resumed: bool,
}

fn position_of(row: &Row) -> Result<Position> {
    row.position()
        .ok_or_else(|| Error::invalid_operation("row has no position"))
}

impl RowSource for PersistentScan {
    fn next_row(&self, session: &Session, after: Option<Position>) -> Result<Option<Row>> {
        let store = self.store()?;
        match store.next_position(after)? {
            Some(pos) => store.get_record(session, pos).map(Some),
            None => Ok(None),
        }
    }
}

impl Index for PersistentScan {
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
        IndexType::scan(true)
    }

    fn add(&mut self, session: &mut Session, row: &mut Row) -> Result<()> {
        let store = self.store()?;
        if self.count.is_multi_version() {
            row.set_session_id(session.id());
        }
        let linked = if self.contains_large_object {
            self.link_large_objects(session, row)?
        } else {
            Vec::new()
        };
        if let Err(err) = store.add_record(session, row, Allocation::Any) {
            self.unlink_large_objects(session, row, linked);
            return Err(err);
        }
        self.count.added(session.id());
        Ok(())
    }

    fn remove(&mut self, session: &mut Session, row: &Row) -> Result<()> {
        let store = self.store()?;
        store.remove_record(session, position_of(row)?)?;
        if self.contains_large_object {
            for value in row.values().iter().filter(|v| v.is_linked()) {
                session.unlink_at_commit(value);
            }
        }
        self.count.removed(session.id());
        Ok(())
    }

    fn find<'a>(
        &'a self,
        session: &'a Session,
        _first: Option<&Row>,
        _last: Option<&Row>,
    ) -> Result<Box<dyn Cursor + 'a>> {
        self.store()?;
        Ok(Box::new(ScanCursor::new(self, session)))
    }

    fn get_row(&self, session: &Session, position: Position) -> Result<Option<Row>> {
        self.store()?.get_record(session, position).map(Some)
    }

    fn row_count(&self, session: &Session) -> u64 {
        self.count.visible(session.id())
    }

    fn cost(&self, session: &Session, _masks: &[u32]) -> f64 {
        ((self.row_count(session) + COST_ROW_OFFSET) * PERSISTENT_COST_FACTOR) as f64
    }

    fn truncate(&mut self, session: &mut Session) -> Result<()> {
        self.store()?.truncate(session)?;
        if self.table_persistent && self.contains_large_object {
            let released = self.lobs.remove_all_for_table(self.table_id)?;
            tracing::debug!("released {} large objects of {}", released, self.name);
        }
        self.count.clear();
        tracing::debug!("truncate {}", self.name);
        Ok(())
    }

    fn close(&mut self, _session: &mut Session) -> Result<()> {
        if self.store.take().is_some() {
            tracing::debug!("close {}", self.name);
        }
        Ok(())
    }

    fn remove_index(&mut self, session: &mut Session) -> Result<()> {
        self.truncate(session)?;
        self.store()?.delete(session)?;
        self.store = None;
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

impl core::fmt::Debug for PersistentScan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PersistentScan")
            .field("name", &self.name)
            .field("contains_large_object", &self.contains_large_object)
            .field("open", &self.is_open())
            .field("count", &self.count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::schema::TableBuilder;
    use cairn_core::DataType;
    use cairn_storage::DatabaseConfig;

    fn docs() -> Table {
        TableBuilder::new(5, "docs")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("body", DataType::Blob)
            .unwrap()
            .build()
            .unwrap()
    }

    fn doc(id: i64, body: &[u8]) -> Row {
        Row::new(vec![Value::Int64(id), Value::Lob(LobValue::blob(body.to_vec()))])
    }

    #[test]
    fn test_open_reads_record_count() {
        let db = Database::open(DatabaseConfig::default());
        let table = docs();
        let mut session = Session::with_id(1);
        {
            let mut scan = PersistentScan::open(&db, &table).unwrap();
            scan.add(&mut session, &mut doc(1, b"a")).unwrap();
            scan.add(&mut session, &mut doc(2, b"b")).unwrap();
        }

        let scan = PersistentScan::open(&db, &table).unwrap();
        assert_eq!(scan.row_count(&session), 2);
        assert!(scan.contains_large_object());
        assert_eq!(scan.name(), "docs_TABLE_SCAN");
        assert!(scan.index_type().is_persistent());
    }

    #[test]
    fn test_add_links_large_objects() {
        let db = Database::open(DatabaseConfig::default());
        let mut scan = PersistentScan::open(&db, &docs()).unwrap();
        let mut session = Session::with_id(1);

        let mut row = doc(1, b"payload");
        scan.add(&mut session, &mut row).unwrap();

        let lob = row.value(1).unwrap().as_lob().unwrap();
        assert!(lob.is_linked());
        assert_eq!(lob.table_id(), Some(5));
        assert_eq!(db.lob_store().read(lob).unwrap(), b"payload".to_vec());

        let stored = scan.get_row(&session, row.position().unwrap()).unwrap().unwrap();
        assert_eq!(stored.values(), row.values());
    }

    #[test]
    fn test_remove_defers_unlink() {
        let db = Database::open(DatabaseConfig::default());
        let mut scan = PersistentScan::open(&db, &docs()).unwrap();
        let mut session = Session::with_id(1);

        let mut row = doc(1, b"payload");
        scan.add(&mut session, &mut row).unwrap();
        scan.remove(&mut session, &row).unwrap();

        let lob = row.value(1).unwrap().as_lob().unwrap();
        assert!(session.pending_unlinks().contains(lob));
        assert_eq!(db.lob_store().read(lob).unwrap(), b"payload".to_vec());
        assert_eq!(scan.row_count(&session), 0);

        // Re-adding the same linked value cancels the pending release.
        let mut again = row.clone();
        scan.add(&mut session, &mut again).unwrap();
        assert!(session.pending_unlinks().is_empty());
        assert_eq!(again.value(1).unwrap(), row.value(1).unwrap());
    }

    #[test]
    fn test_cost_is_scaled() {
        let db = Database::open(DatabaseConfig::default());
        let mut scan = PersistentScan::open(&db, &docs()).unwrap();
        let mut session = Session::with_id(1);
        assert_eq!(scan.cost(&session, &[]), 10_000.0);
        scan.add(&mut session, &mut doc(1, b"")).unwrap();
        assert_eq!(scan.cost(&session, &[]), 10_010.0);
    }

    #[test]
    fn test_truncate_releases_large_objects() {
        let db = Database::open(DatabaseConfig::default());
        let mut scan = PersistentScan::open(&db, &docs()).unwrap();
        let mut session = Session::with_id(1);
        let mut row = doc(1, b"x");
        scan.add(&mut session, &mut row).unwrap();

        scan.truncate(&mut session).unwrap();
        assert_eq!(scan.row_count(&session), 0);
        assert!(db.lob_store().read(row.value(1).unwrap().as_lob().unwrap()).is_err());
        assert!(scan.find(&session, None, None).unwrap().collect_rows().unwrap().is_empty());
    }

    #[test]
    fn test_closed_index_rejects_operations() {
        let db = Database::open(DatabaseConfig::default());
        let mut scan = PersistentScan::open(&db, &docs()).unwrap();
        let mut session = Session::with_id(1);
        scan.close(&mut session).unwrap();
        scan.close(&mut session).unwrap();

        assert!(!scan.is_open());
        assert!(matches!(
            scan.add(&mut session, &mut doc(1, b"")),
            Err(Error::InvalidOperation { .. })
        ));
        assert!(matches!(
            scan.find(&session, None, None).err(),
            Some(Error::InvalidOperation { .. })
        ));
        assert!(matches!(
            scan.get_row(&session, 0),
            Err(Error::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_remove_index_deletes_store() {
        let db = Database::open(DatabaseConfig::default());
        let table = docs();
        let mut scan = PersistentScan::open(&db, &table).unwrap();
        let mut session = Session::with_id(1);
        scan.add(&mut session, &mut doc(1, b"x")).unwrap();

        let store = db.storage(&table, 5, false).unwrap();
        scan.remove_index(&mut session).unwrap();
        assert!(!scan.is_open());
        assert!(matches!(store.next_position(None), Err(Error::Storage { .. })));
    }
}
