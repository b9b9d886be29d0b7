//! Schema module for the Cairn row store.
//!
//! This module contains the table, column and index-type definitions the
//! storage core needs to decide how a table's rows are kept.

mod column;
mod index;
mod table;

pub use column::Column;
pub use index::{IndexKind, IndexType};
pub use table::{Table, TableBuilder};
