//! Data type definitions for the Cairn row store.
//!
//! This module defines the column types a table can declare and the integer
//! handles shared across the workspace.

/// Identifier of a table (and of its scan index). Negative ids mark
/// tables that never touch durable storage.
pub type TableId = i32;

/// Identifier of a session. Zero means "no owning session".
pub type SessionId = u32;

/// Opaque row position, meaningful only within the owning index or store.
pub type Position = u64;

/// Supported column data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
    /// Binary data stored inline in the row
    Bytes,
    /// Binary large object, stored outside the row once linked
    Blob,
    /// Character large object, stored outside the row once linked
    Clob,
}

impl DataType {
    /// Returns whether values of this type may be linked into the external
    /// large-object store.
    pub fn is_large_object(&self) -> bool {
        matches!(self, DataType::Blob | DataType::Clob)
    }

    /// Returns the SQL name of this type.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::Float64 => "DOUBLE",
            DataType::String => "VARCHAR",
            DataType::DateTime => "TIMESTAMP",
            DataType::Bytes => "BINARY",
            DataType::Blob => "BLOB",
            DataType::Clob => "CLOB",
        }
    }
}
