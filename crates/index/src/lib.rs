//! Cairn Index - Table-scan index and transaction driver for the Cairn row store.
//!
//! This crate provides:
//!
//! - `Index` / `Cursor`: The contract every index variant satisfies
//! - `ScanIndex`: The per-table scan index, in-memory (`TransientScan`) or
//!   store-backed (`PersistentScan`)
//! - `RowCount`: Row counting with optional per-session multi-version views
//! - `Transaction`: Undo logging, commit hooks and rollback replay
//!
//! # Example
//!
//! ```rust
//! use cairn_core::schema::TableBuilder;
//! use cairn_core::{DataType, Row, Value};
//! use cairn_index::{Index, ScanIndex, Transaction};
//! use cairn_storage::{Database, DatabaseConfig, Session};
//!
//! let db = Database::open(DatabaseConfig::new("demo").with_multi_version(true));
//! let table = TableBuilder::new(1, "users")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut index = ScanIndex::open(&db, &table).unwrap();
//!
//! let mut tx = Transaction::begin(Session::new());
//! tx.insert(&mut index, Row::new(vec![Value::Int64(1)])).unwrap();
//!
//! // Uncommitted rows are only counted for their own session.
//! let other = Session::new();
//! assert_eq!(index.row_count(tx.session()), 1);
//! assert_eq!(index.row_count(&other), 0);
//!
//! let lobs = db.lob_store();
//! tx.commit(&mut [&mut index], lobs.as_ref()).unwrap();
//! assert_eq!(index.row_count(&other), 1);
//! ```

pub mod row_count;
pub mod scan;
pub mod traits;
pub mod transaction;

pub use row_count::{RowCount, SessionDeltas};
pub use scan::{PersistentScan, ScanCursor, ScanIndex, TransientScan, COST_ROW_OFFSET, PERSISTENT_COST_FACTOR};
pub use traits::{Cursor, Index};
pub use transaction::{Transaction, TransactionState};
