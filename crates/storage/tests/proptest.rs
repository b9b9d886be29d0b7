//! Property-based tests for cairn-storage using proptest.

use cairn_core::{LobValue, Position, Row, Value};
use cairn_storage::{Allocation, LobStore, MemoryLobStore, MemoryRecordStore, RecordStore, Session};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Add(String),
    /// Remove the n-th stored record, modulo the record count.
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[a-z]{0,300}".prop_map(Op::Add),
        2 => any::<usize>().prop_map(Op::Remove),
    ]
}

proptest! {
    /// The store agrees with a map model, and always hands out the lowest
    /// free position.
    #[test]
    fn record_store_matches_model(ops in prop::collection::vec(op_strategy(), 0..150)) {
        let store = MemoryRecordStore::new();
        let session = Session::with_id(1);
        let mut model: BTreeMap<Position, String> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(text) => {
                    let expected = (0..).find(|p| !model.contains_key(p)).unwrap();
                    let mut row = Row::new(vec![Value::String(text.clone())]);
                    let pos = store.add_record(&session, &mut row, Allocation::Any).unwrap();
                    prop_assert_eq!(pos, expected);
                    prop_assert_eq!(row.position(), Some(pos));
                    prop_assert_eq!(row.block_count() as usize, (row.byte_count() + 127) / 128);
                    model.insert(pos, text);
                }
                Op::Remove(n) => {
                    if model.is_empty() {
                        continue;
                    }
                    let pos = *model.keys().nth(n % model.len()).unwrap();
                    model.remove(&pos);
                    store.remove_record(&session, pos).unwrap();
                }
            }
        }

        prop_assert_eq!(store.record_count(), model.len() as u64);
        let mut after = None;
        let mut walked = Vec::new();
        while let Some(pos) = store.next_position(after).unwrap() {
            let row = store.get_record(&session, pos).unwrap();
            walked.push((pos, row.value(0).unwrap().as_str().unwrap().to_string()));
            after = Some(pos);
        }
        prop_assert_eq!(walked, model.into_iter().collect::<Vec<_>>());
    }

    /// Linking copies the payload exactly and linking again is a no-op.
    #[test]
    fn lob_link_preserves_payload(data in prop::collection::vec(any::<u8>(), 0..512), table in 0i32..8) {
        let store = MemoryLobStore::new();
        let linked = store.link(&LobValue::blob(data.clone()), table).unwrap();
        prop_assert_eq!(linked.len(), data.len() as u64);
        prop_assert_eq!(store.read(&linked).unwrap(), data);
        prop_assert_eq!(store.link(&linked, table).unwrap(), linked);
        prop_assert_eq!(store.object_count(), 1);
    }
}
