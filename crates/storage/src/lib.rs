//! Cairn Storage - Storage collaborators for the Cairn row store.
//!
//! This crate provides the pieces an index talks to:
//!
//! - `RecordStore`: Durable row storage by position, with `MemoryRecordStore`
//! - `LobStore`: External large-object storage, with `MemoryLobStore`
//! - `Session`: Session identity, undo log and deferred large-object releases
//! - `UndoLog`: Change tracking for rollback and multi-version commit
//! - `DatabaseConfig`: Persistence and multi-version settings
//! - `Database`: Configuration plus the record-store registry
//!
//! # Example
//!
//! ```rust
//! use cairn_storage::{Allocation, Database, DatabaseConfig, Session};
//! use cairn_core::schema::TableBuilder;
//! use cairn_core::{DataType, Row, Value};
//!
//! let db = Database::open(DatabaseConfig::from_settings("demo", "MVCC=TRUE").unwrap());
//! let table = TableBuilder::new(1, "users")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let session = Session::new();
//! let store = db.storage(&table, table.id(), true).unwrap();
//! let mut row = Row::new(vec![Value::Int64(1)]);
//! let pos = store.add_record(&session, &mut row, Allocation::Any).unwrap();
//!
//! assert_eq!(store.get_record(&session, pos).unwrap().values(), row.values());
//! assert_eq!(store.record_count(), 1);
//! ```

pub mod config;
pub mod database;
pub mod lob;
pub mod record_store;
pub mod session;
pub mod undo;

pub use config::DatabaseConfig;
pub use database::Database;
pub use lob::{LobStore, MemoryLobStore};
pub use record_store::{Allocation, MemoryRecordStore, RecordStore};
pub use session::{PendingUnlinks, Session};
pub use undo::{UndoLog, UndoLogRecord, UndoOperation};
