//! Forward cursor shared by both scan variants.

use crate::traits::Cursor;
use cairn_core::{Position, Result, Row};
use cairn_storage::Session;

/// Anything that can produce the next live row after a position.
pub(crate) trait RowSource {
    /// Returns the first live row after `after`, or the first row overall
    /// when `after` is `None`.
    fn next_row(&self, session: &Session, after: Option<Position>) -> Result<Option<Row>>;
}

/// Cursor walking every live row of a scan index in position order.
pub struct ScanCursor<'a> {
    source: &'a dyn RowSource,
    session: &'a Session,
    current: Option<Row>,
    last: Option<Position>,
    done: bool,
}

impl<'a> ScanCursor<'a> {
    pub(crate) fn new(source: &'a dyn RowSource, session: &'a Session) -> Self {
        Self {
            source,
            session,
            current: None,
            last: None,
            done: false,
        }
    }
}

impl Cursor for ScanCursor<'_> {
    fn advance(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        match self.source.next_row(self.session, self.last)? {
            Some(row) => {
                self.last = row.position();
                self.current = Some(row);
                Ok(true)
            }
            None => {
                self.current = None;
                self.done = true;
                Ok(false)
            }
        }
    }

    #[inline]
    fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::Value;
    use std::collections::BTreeMap;

    struct MapSource(BTreeMap<Position, i64>);

    impl RowSource for MapSource {
        fn next_row(&self, _session: &Session, after: Option<Position>) -> Result<Option<Row>> {
            let start = after.map(|p| p + 1).unwrap_or(0);
            Ok(self.0.range(start..).next().map(|(pos, v)| {
                let mut row = Row::new(vec![Value::Int64(*v)]);
                row.set_position(*pos);
                row
            }))
        }
    }

    #[test]
    fn test_cursor_walks_in_position_order() {
        let source = MapSource([(4, 40), (1, 10), (9, 90)].into_iter().collect());
        let session = Session::with_id(1);
        let mut cursor = ScanCursor::new(&source, &session);

        let positions: Vec<_> = cursor
            .collect_rows()
            .unwrap()
            .iter()
            .map(|r| r.position().unwrap())
            .collect();
        assert_eq!(positions, vec![1, 4, 9]);
        assert!(cursor.current().is_none());
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn test_cursor_on_empty_source() {
        let source = MapSource(BTreeMap::new());
        let session = Session::with_id(1);
        let mut cursor = ScanCursor::new(&source, &session);
        assert!(!cursor.advance().unwrap());
        assert!(cursor.current().is_none());
    }
}
