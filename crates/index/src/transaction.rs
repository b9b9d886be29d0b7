//! Transaction driver for Cairn.
//!
//! A transaction owns a session, logs every successful add and remove to the
//! session's undo log, and at the end either finalizes the logged changes on
//! each index or replays them in reverse. Both paths then drain the session's
//! deferred large-object releases into the large-object store.

use crate::traits::Index;
use cairn_core::{Error, Result, Row, Value};
use cairn_storage::{LobStore, Session, UndoLogRecord, UndoOperation};

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A database transaction.
#[derive(Debug)]
pub struct Transaction {
    session: Session,
    state: TransactionState,
}

impl Transaction {
    /// Starts a transaction on `session`.
    pub fn begin(session: Session) -> Self {
        Self {
            session,
            state: TransactionState::Active,
        }
    }

    /// Returns the session.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Checks if the transaction is active, returns error if not.
    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::invalid_operation("Transaction is not active"));
        }
        Ok(())
    }

    /// Inserts a row, returning it as stored.
    pub fn insert(&mut self, index: &mut dyn Index, mut row: Row) -> Result<Row> {
        self.check_active()?;
        index.add(&mut self.session, &mut row)?;
        self.session
            .log(UndoLogRecord::insert(index.table_id(), row.clone()));
        Ok(row)
    }

    /// Deletes a stored row.
    pub fn delete(&mut self, index: &mut dyn Index, row: &Row) -> Result<()> {
        self.check_active()?;
        index.remove(&mut self.session, row)?;
        let mut logged = row.clone();
        logged.set_session_id(self.session.id());
        self.session.log(UndoLogRecord::delete(index.table_id(), logged));
        Ok(())
    }

    /// Commits the transaction.
    ///
    /// Each logged change is passed to the commit hook of every index of its
    /// table, then the deferred large-object releases are carried out. If a
    /// release fails the transaction stays active with the unreleased objects
    /// still queued, and calling `commit` again retries them.
    pub fn commit(&mut self, indexes: &mut [&mut dyn Index], lobs: &dyn LobStore) -> Result<()> {
        self.check_active()?;

        let records = self.session.undo_log_mut().take();
        tracing::debug!("commit session {}: {} changes", self.session.id(), records.len());
        for record in &records {
            for index in indexes
                .iter_mut()
                .filter(|index| index.table_id() == record.table_id())
            {
                index.commit(record.operation(), record.row());
            }
        }
        self.release_large_objects(lobs)?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Rolls back the transaction.
    ///
    /// The log is replayed newest first: inserted rows are removed and
    /// deleted rows are added back. A record leaves the log only once it has
    /// been undone, so after a failure the transaction stays active and
    /// calling `rollback` again resumes with the first change not yet undone.
    pub fn rollback(&mut self, indexes: &mut [&mut dyn Index], lobs: &dyn LobStore) -> Result<()> {
        self.check_active()?;

        tracing::debug!(
            "rollback session {}: {} changes",
            self.session.id(),
            self.session.undo_log().len()
        );
        loop {
            let (table_id, operation, mut row) = match self.session.undo_log().last() {
                Some(record) => (record.table_id(), record.operation(), record.row().clone()),
                None => break,
            };
            row.set_deleted(false);
            for index in indexes
                .iter_mut()
                .filter(|index| index.table_id() == table_id)
            {
                match operation {
                    UndoOperation::Insert => index.remove(&mut self.session, &row)?,
                    UndoOperation::Delete => index.add(&mut self.session, &mut row)?,
                }
            }
            self.session.undo_log_mut().pop_replayed(row.position());
        }
        self.release_large_objects(lobs)?;
        self.state = TransactionState::RolledBack;
        Ok(())
    }

    /// Releases every queued large object. Objects that fail to release stay
    /// queued, and the first failure is returned.
    fn release_large_objects(&mut self, lobs: &dyn LobStore) -> Result<()> {
        let pending = self.session.take_pending_unlinks();
        if pending.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            "session {}: releasing {} large objects",
            self.session.id(),
            pending.len()
        );
        let mut first_error = None;
        for lob in pending {
            if let Err(err) = lobs.unlink(&lob) {
                let value = Value::Lob(lob);
                tracing::warn!("session {}: release of {} failed: {}", self.session.id(), value, err);
                self.session.unlink_at_commit(&value);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Ends the transaction, returning the session for reuse.
    pub fn into_session(self) -> Session {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanIndex;
    use cairn_core::schema::{Table, TableBuilder};
    use cairn_core::{DataType, LobValue, Value};
    use cairn_storage::{Database, DatabaseConfig, MemoryLobStore};

    fn test_table(persistent: bool) -> Table {
        TableBuilder::new(1, "test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .persistent(persistent)
            .build()
            .unwrap()
    }

    fn row(id: i64) -> Row {
        Row::new(vec![Value::Int64(id), Value::String(format!("row {}", id))])
    }

    #[test]
    fn test_transaction_begin() {
        let tx = Transaction::begin(Session::with_id(3));
        assert!(tx.is_active());
        assert_eq!(tx.session().id(), 3);
        assert_eq!(tx.state(), TransactionState::Active);
    }

    #[test]
    fn test_transaction_insert_commit() {
        let db = Database::open(DatabaseConfig::default());
        let mut index = ScanIndex::open(&db, &test_table(true)).unwrap();
        let lobs = MemoryLobStore::new();

        let mut tx = Transaction::begin(Session::with_id(1));
        let stored = tx.insert(&mut index, row(1)).unwrap();
        assert!(stored.position().is_some());
        assert_eq!(tx.session().undo_log().len(), 1);

        tx.commit(&mut [&mut index], &lobs).unwrap();
        assert_eq!(tx.state(), TransactionState::Committed);
        assert!(tx.session().undo_log().is_empty());
        assert_eq!(index.row_count(tx.session()), 1);
    }

    #[test]
    fn test_transaction_rollback() {
        let db = Database::open(DatabaseConfig::in_memory("mem"));
        let mut index = ScanIndex::open(&db, &test_table(true)).unwrap();
        let lobs = MemoryLobStore::new();

        let mut setup = Transaction::begin(Session::with_id(1));
        let kept = setup.insert(&mut index, row(1)).unwrap();
        setup.commit(&mut [&mut index], &lobs).unwrap();

        let mut tx = Transaction::begin(Session::with_id(1));
        tx.insert(&mut index, row(2)).unwrap();
        tx.delete(&mut index, &kept).unwrap();
        assert_eq!(index.row_count(tx.session()), 1);

        tx.rollback(&mut [&mut index], &lobs).unwrap();
        assert_eq!(tx.state(), TransactionState::RolledBack);

        let session = tx.into_session();
        let rows = index.find(&session, None, None).unwrap().collect_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), kept.values());
    }

    #[test]
    fn test_rollback_follows_moved_rows() {
        let db = Database::open(DatabaseConfig::default());
        let mut index = ScanIndex::open(&db, &test_table(true)).unwrap();
        let lobs = MemoryLobStore::new();

        let mut setup = Transaction::begin(Session::with_id(1));
        let rows: Vec<Row> = (0..3).map(|i| setup.insert(&mut index, row(i)).unwrap()).collect();
        setup.commit(&mut [&mut index], &lobs).unwrap();

        let mut tx = Transaction::begin(Session::with_id(2));
        let inserted = tx.insert(&mut index, row(9)).unwrap();
        assert_eq!(inserted.position(), Some(3));
        tx.delete(&mut index, &rows[1]).unwrap();
        tx.delete(&mut index, &inserted).unwrap();

        // Replay re-adds row 9 at position 1 and row 1 at position 3, so
        // undoing the insert has to follow row 9 to its new position.
        tx.rollback(&mut [&mut index], &lobs).unwrap();
        let session = tx.into_session();
        let mut ids: Vec<_> = index
            .find(&session, None, None)
            .unwrap()
            .collect_rows()
            .unwrap()
            .iter()
            .map(|r| r.value(0).unwrap().as_i64().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_commit_releases_large_objects() {
        let table = TableBuilder::new(2, "docs")
            .unwrap()
            .add_column("body", DataType::Clob)
            .unwrap()
            .build()
            .unwrap();
        let db = Database::open(DatabaseConfig::default());
        let mut index = ScanIndex::open(&db, &table).unwrap();
        let lobs = db.lob_store();

        let mut tx = Transaction::begin(Session::with_id(1));
        let stored = tx
            .insert(&mut index, Row::new(vec![Value::Lob(LobValue::clob("hello"))]))
            .unwrap();
        tx.commit(&mut [&mut index], lobs.as_ref()).unwrap();

        let lob = stored.value(0).unwrap().as_lob().unwrap().clone();
        let mut tx = Transaction::begin(tx.into_session());
        tx.delete(&mut index, &stored).unwrap();
        assert!(lobs.read(&lob).is_ok());

        tx.commit(&mut [&mut index], lobs.as_ref()).unwrap();
        assert!(lobs.read(&lob).is_err());
    }

    #[test]
    fn test_inactive_transaction() {
        let db = Database::open(DatabaseConfig::in_memory("mem"));
        let mut index = ScanIndex::open(&db, &test_table(false)).unwrap();
        let lobs = MemoryLobStore::new();

        let mut tx = Transaction::begin(Session::with_id(1));
        tx.commit(&mut [&mut index], &lobs).unwrap();

        assert!(matches!(
            tx.insert(&mut index, row(1)),
            Err(Error::InvalidOperation { .. })
        ));
        assert!(matches!(
            tx.rollback(&mut [&mut index], &lobs),
            Err(Error::InvalidOperation { .. })
        ));
        assert!(matches!(
            tx.commit(&mut [&mut index], &lobs),
            Err(Error::InvalidOperation { .. })
        ));
    }
}
