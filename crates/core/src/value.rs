//! Value type definitions for the Cairn row store.
//!
//! This module defines the `Value` enum which represents any value that can be stored
//! in a row cell, including large objects that live outside the row once linked.

use crate::row::saturating_u32;
use crate::types::{DataType, TableId};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Kind of a large object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LobKind {
    /// Binary large object.
    Blob,
    /// Character large object (UTF-8 payload).
    Clob,
}

impl LobKind {
    /// Returns the column type matching this kind.
    pub fn data_type(&self) -> DataType {
        match self {
            LobKind::Blob => DataType::Blob,
            LobKind::Clob => DataType::Clob,
        }
    }
}

/// Where the bytes of a large object live.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LobPayload {
    /// Not yet linked: the payload travels with the row.
    Inline(Vec<u8>),
    /// Linked into the external store under `(table_id, object_id)`.
    Linked {
        table_id: TableId,
        object_id: u64,
        length: u64,
    },
}

/// A large object value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LobValue {
    kind: LobKind,
    payload: LobPayload,
}

impl LobValue {
    /// Creates an unlinked large object holding `data`.
    pub fn inline(kind: LobKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            payload: LobPayload::Inline(data),
        }
    }

    /// Creates a reference to an object already stored externally.
    pub fn linked(kind: LobKind, table_id: TableId, object_id: u64, length: u64) -> Self {
        Self {
            kind,
            payload: LobPayload::Linked {
                table_id,
                object_id,
                length,
            },
        }
    }

    /// Creates an unlinked blob.
    pub fn blob(data: impl Into<Vec<u8>>) -> Self {
        Self::inline(LobKind::Blob, data.into())
    }

    /// Creates an unlinked clob.
    pub fn clob(text: impl Into<String>) -> Self {
        Self::inline(LobKind::Clob, text.into().into_bytes())
    }

    /// Returns the kind of this object.
    #[inline]
    pub fn kind(&self) -> LobKind {
        self.kind
    }

    /// Returns the payload.
    #[inline]
    pub fn payload(&self) -> &LobPayload {
        &self.payload
    }

    /// Returns true if the bytes live in the external store.
    #[inline]
    pub fn is_linked(&self) -> bool {
        matches!(self.payload, LobPayload::Linked { .. })
    }

    /// Returns the `(table_id, object_id)` key of a linked object.
    pub fn link_key(&self) -> Option<(TableId, u64)> {
        match self.payload {
            LobPayload::Linked {
                table_id,
                object_id,
                ..
            } => Some((table_id, object_id)),
            LobPayload::Inline(_) => None,
        }
    }

    /// Returns the table a linked object belongs to.
    pub fn table_id(&self) -> Option<TableId> {
        self.link_key().map(|(table_id, _)| table_id)
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> u64 {
        match &self.payload {
            LobPayload::Inline(data) => data.len() as u64,
            LobPayload::Linked { length, .. } => *length,
        }
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the inline bytes, if this object is not linked.
    pub fn inline_data(&self) -> Option<&[u8]> {
        match &self.payload {
            LobPayload::Inline(data) => Some(data),
            LobPayload::Linked { .. } => None,
        }
    }
}

/// A value that can be stored in a row cell.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// DateTime stored as Unix timestamp in milliseconds
    DateTime(i64),
    /// Binary data
    Bytes(Vec<u8>),
    /// Large object, inline or linked
    Lob(LobValue),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Bytes(_) => Some(DataType::Bytes),
            Value::Lob(lob) => Some(lob.kind().data_type()),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a large object linked into the external store.
    #[inline]
    pub fn is_linked(&self) -> bool {
        matches!(self, Value::Lob(lob) if lob.is_linked())
    }

    /// Returns the i32 value if this is an Int32, None otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int64, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the large object if this is a Lob, None otherwise.
    pub fn as_lob(&self) -> Option<&LobValue> {
        match self {
            Value::Lob(lob) => Some(lob),
            _ => None,
        }
    }

    /// Estimated in-memory weight of this value, in 4-byte units.
    pub fn memory(&self) -> u32 {
        match self {
            Value::Null | Value::Boolean(_) => 1,
            Value::Int32(_) => 2,
            Value::Int64(_) | Value::Float64(_) | Value::DateTime(_) => 3,
            Value::String(s) => saturating_u32(s.len() / 2).saturating_add(6),
            Value::Bytes(b) => saturating_u32(b.len() / 4).saturating_add(6),
            Value::Lob(lob) => match lob.payload() {
                LobPayload::Inline(data) => saturating_u32(data.len() / 4).saturating_add(10),
                LobPayload::Linked { .. } => 12,
            },
        }
    }

    /// Returns a type ordering value for comparing different types.
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int32(_) => 2,
            Value::Int64(_) => 3,
            Value::Float64(_) => 4,
            Value::String(_) => 5,
            Value::DateTime(_) => 6,
            Value::Bytes(_) => 7,
            Value::Lob(_) => 8,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Lob(a), Value::Lob(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            // Numerically equal integers of different width are unequal values.
            (Value::Int32(a), Value::Int64(b)) => (*a as i64)
                .cmp(b)
                .then(self.type_order().cmp(&other.type_order())),
            (Value::Int64(a), Value::Int32(b)) => a
                .cmp(&(*b as i64))
                .then(self.type_order().cmp(&other.type_order())),
            (Value::Float64(a), Value::Float64(b)) => {
                // NaN sorts after every other float
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                }
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Lob(a), Value::Lob(b)) => a.cmp(b),
            // Different types: order by type discriminant
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Int32(i) => i.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => float_bits(*f).hash(state),
            Value::String(s) => s.hash(state),
            Value::DateTime(d) => d.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Lob(lob) => lob.hash(state),
        }
    }
}

/// Bit pattern used for hashing: every NaN hashes alike and `-0.0`
/// hashes as `0.0`, matching `PartialEq`.
fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("X'")?;
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    f.write_str("'")
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("'")?;
    for part in text.split('\'').enumerate() {
        if part.0 > 0 {
            f.write_str("''")?;
        }
        f.write_str(part.1)?;
    }
    f.write_str("'")
}

/// Formats the value as a SQL literal.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{:?}", v),
            Value::String(s) => write_quoted(f, s),
            Value::DateTime(ms) => write!(f, "CAST({} AS TIMESTAMP)", ms),
            Value::Bytes(b) => write_hex(f, b),
            Value::Lob(lob) => match lob.payload() {
                LobPayload::Inline(data) => match lob.kind() {
                    LobKind::Blob => write_hex(f, data),
                    LobKind::Clob => write_quoted(f, &String::from_utf8_lossy(data)),
                },
                LobPayload::Linked {
                    table_id,
                    object_id,
                    length,
                } => write!(
                    f,
                    "{}({}, {}, {})",
                    lob.kind().data_type().sql_name(),
                    table_id,
                    object_id,
                    length
                ),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<LobValue> for Value {
    fn from(v: LobValue) -> Self {
        Value::Lob(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
