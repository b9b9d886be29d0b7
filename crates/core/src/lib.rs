//! Cairn Core - Core types, row codec and schema definitions for the Cairn row store.
//!
//! This crate provides the foundational types shared by the storage and index crates:
//!
//! - `DataType`: Column types, including the `Blob`/`Clob` large-object types
//! - `Value`: Immutable cell values; `LobValue` for inline or linked large objects
//! - `Row`: An ordered tuple of values plus a position handle
//! - `codec`: The byte-exact on-disk row encoding
//! - `schema`: Table, column and index-type definitions
//! - `Error`: Error kinds shared across the workspace
//!
//! # Example
//!
//! ```rust
//! use cairn_core::{DataType, LobValue, Row, Value};
//! use cairn_core::schema::TableBuilder;
//!
//! let table = TableBuilder::new(1, "docs")
//!     .unwrap()
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("body", DataType::Clob)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! assert!(table.contains_large_object());
//!
//! let row = Row::new(vec![Value::Int64(1), Value::Lob(LobValue::clob("hello"))]);
//! let bytes = row.encode().unwrap();
//! assert_eq!(bytes.len(), row.byte_count());
//!
//! let decoded = Row::decode(&bytes).unwrap();
//! assert_eq!(decoded.values(), row.values());
//! ```

pub mod codec;
mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::{Row, BLOCK_SIZE};
pub use types::{DataType, Position, SessionId, TableId};
pub use value::{LobKind, LobPayload, LobValue, Value};
