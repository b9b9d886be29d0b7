//! On-disk row encoding.
//!
//! A row is written as a little-endian `u32` column count followed by each
//! value in a self-describing form: one tag byte, then a payload whose length
//! is determined by the tag alone. This lets a reader walk a record value by
//! value without a separate length table.
//!
//! [`value_len`] and [`row_byte_count`] must agree exactly with what the
//! writers emit, because callers use them to pre-size buffers.

use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::{LobKind, LobPayload, LobValue, Value};

const TAG_NULL: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_INT32: u8 = 2;
const TAG_INT64: u8 = 3;
const TAG_FLOAT64: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_DATETIME: u8 = 6;
const TAG_BYTES: u8 = 7;
const TAG_BLOB: u8 = 8;
const TAG_CLOB: u8 = 9;

const LOB_INLINE: u8 = 0;
const LOB_LINKED: u8 = 1;

/// Encoded length of the column-count prefix.
pub const INT_LEN: usize = 4;

/// Returns the number of bytes [`write_value`] emits for `value`.
pub fn value_len(value: &Value) -> usize {
    1 + match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Int32(_) => 4,
        Value::Int64(_) | Value::Float64(_) | Value::DateTime(_) => 8,
        Value::String(s) => INT_LEN + s.len(),
        Value::Bytes(b) => INT_LEN + b.len(),
        Value::Lob(lob) => {
            1 + match lob.payload() {
                LobPayload::Inline(data) => INT_LEN + data.len(),
                LobPayload::Linked { .. } => 4 + 8 + 8,
            }
        }
    }
}

/// Returns the number of bytes [`write_row`] emits for `row`.
pub fn row_byte_count(row: &Row) -> usize {
    INT_LEN + row.values().iter().map(value_len).sum::<usize>()
}

/// Length prefixes are `u32`; longer payloads cannot be encoded.
#[inline]
fn write_len(buf: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| Error::invalid_operation(format!("length {} exceeds u32 prefix", len)))?;
    buf.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Appends the encoding of `value` to `buf`.
pub fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Boolean(b) => {
            buf.push(TAG_BOOLEAN);
            buf.push(u8::from(*b));
        }
        Value::Int32(v) => {
            buf.push(TAG_INT32);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Value::Int64(v) => {
            buf.push(TAG_INT64);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Value::Float64(v) => {
            buf.push(TAG_FLOAT64);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            buf.push(TAG_STRING);
            write_len(buf, s.len())?;
            buf.extend_from_slice(s.as_bytes());
        }
        Value::DateTime(v) => {
            buf.push(TAG_DATETIME);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Value::Bytes(b) => {
            buf.push(TAG_BYTES);
            write_len(buf, b.len())?;
            buf.extend_from_slice(b);
        }
        Value::Lob(lob) => {
            buf.push(match lob.kind() {
                LobKind::Blob => TAG_BLOB,
                LobKind::Clob => TAG_CLOB,
            });
            match lob.payload() {
                LobPayload::Inline(data) => {
                    buf.push(LOB_INLINE);
                    write_len(buf, data.len())?;
                    buf.extend_from_slice(data);
                }
                LobPayload::Linked {
                    table_id,
                    object_id,
                    length,
                } => {
                    buf.push(LOB_LINKED);
                    buf.extend_from_slice(&table_id.to_le_bytes());
                    buf.extend_from_slice(&object_id.to_le_bytes());
                    buf.extend_from_slice(&length.to_le_bytes());
                }
            }
        }
    }
    Ok(())
}

/// Appends the encoding of `row` to `buf`.
pub fn write_row(buf: &mut Vec<u8>, row: &Row) -> Result<()> {
    buf.reserve(row_byte_count(row));
    write_len(buf, row.column_count())?;
    for value in row.values() {
        write_value(buf, value)?;
    }
    Ok(())
}

/// Forward-only reader over an encoded record.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::corrupted(format!(
                "truncated record: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn read_vec(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    /// Decodes the next value.
    pub fn read_value(&mut self) -> Result<Value> {
        let tag = self.read_u8()?;
        let value = match tag {
            TAG_NULL => Value::Null,
            TAG_BOOLEAN => match self.read_u8()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => {
                    return Err(Error::corrupted(format!("invalid boolean byte {}", other)))
                }
            },
            TAG_INT32 => Value::Int32(i32::from_le_bytes(self.array()?)),
            TAG_INT64 => Value::Int64(self.read_i64()?),
            TAG_FLOAT64 => Value::Float64(f64::from_bits(self.read_u64()?)),
            TAG_STRING => {
                let bytes = self.read_vec()?;
                let s = String::from_utf8(bytes)
                    .map_err(|e| Error::corrupted(format!("invalid UTF-8 string: {}", e)))?;
                Value::String(s)
            }
            TAG_DATETIME => Value::DateTime(self.read_i64()?),
            TAG_BYTES => Value::Bytes(self.read_vec()?),
            TAG_BLOB | TAG_CLOB => {
                let kind = if tag == TAG_BLOB {
                    LobKind::Blob
                } else {
                    LobKind::Clob
                };
                match self.read_u8()? {
                    LOB_INLINE => Value::Lob(LobValue::inline(kind, self.read_vec()?)),
                    LOB_LINKED => {
                        let table_id = i32::from_le_bytes(self.array()?);
                        let object_id = self.read_u64()?;
                        let length = self.read_u64()?;
                        Value::Lob(LobValue::linked(kind, table_id, object_id, length))
                    }
                    other => {
                        return Err(Error::corrupted(format!("invalid lob storage tag {}", other)))
                    }
                }
            }
            other => return Err(Error::corrupted(format!("unknown value tag {}", other))),
        };
        Ok(value)
    }

    /// Decodes a full row: the column count, then that many values.
    pub fn read_row(&mut self) -> Result<Row> {
        let count = self.read_len()?;
        // Every value takes at least its tag byte.
        if count > self.remaining() {
            return Err(Error::corrupted(format!(
                "column count {} exceeds remaining {} bytes",
                count,
                self.remaining()
            )));
        }
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_value()?);
        }
        Ok(Row::new(values))
    }
}

impl Row {
    /// Exact number of bytes [`Row::write`] appends.
    pub fn byte_count(&self) -> usize {
        row_byte_count(self)
    }

    /// Appends the on-disk encoding of this row to `buf`.
    ///
    /// Fails if a payload is too long for its `u32` length prefix.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_row(buf, self)
    }

    /// Encodes this row into a fresh, exactly-sized buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.byte_count());
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Decodes a record produced by [`Row::write`]. Trailing bytes are an error.
    pub fn decode(data: &[u8]) -> Result<Row> {
        let mut reader = Reader::new(data);
        let row = reader.read_row()?;
        if reader.remaining() != 0 {
            return Err(Error::corrupted(format!(
                "{} trailing bytes after row",
                reader.remaining()
            )));
        }
        Ok(row)
    }
}
