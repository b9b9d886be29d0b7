//! Property-based tests for the cairn-core row codec using proptest.

use cairn_core::codec::{value_len, write_value};
use cairn_core::{LobKind, LobValue, Row, Value};
use proptest::prelude::*;

fn lob_strategy() -> impl Strategy<Value = LobValue> {
    let kind = prop_oneof![Just(LobKind::Blob), Just(LobKind::Clob)];
    prop_oneof![
        (kind.clone(), prop::collection::vec(any::<u8>(), 0..256))
            .prop_map(|(kind, data)| LobValue::inline(kind, data)),
        (kind, any::<i32>(), any::<u64>(), any::<u64>())
            .prop_map(|(kind, table, object, len)| LobValue::linked(kind, table, object, len)),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        any::<f64>().prop_map(Value::Float64),
        ".{0,64}".prop_map(Value::String),
        any::<i64>().prop_map(Value::DateTime),
        prop::collection::vec(any::<u8>(), 0..128).prop_map(Value::Bytes),
        lob_strategy().prop_map(Value::Lob),
    ]
}

proptest! {
    /// Decoding an encoded row yields the same values in the same order.
    #[test]
    fn row_roundtrip(values in prop::collection::vec(value_strategy(), 0..24)) {
        let row = Row::new(values);
        let decoded = Row::decode(&row.encode().unwrap()).unwrap();
        prop_assert_eq!(decoded.column_count(), row.column_count());
        prop_assert_eq!(decoded.values(), row.values());
    }

    /// The byte-count estimate equals the written length, never more.
    #[test]
    fn byte_count_is_exact(values in prop::collection::vec(value_strategy(), 0..24)) {
        let row = Row::new(values);
        let mut buf = Vec::new();
        row.write(&mut buf).unwrap();
        prop_assert_eq!(buf.len(), row.byte_count());
    }

    /// Each value's length is computable on its own.
    #[test]
    fn value_len_is_exact(value in value_strategy()) {
        let mut buf = Vec::new();
        write_value(&mut buf, &value).unwrap();
        prop_assert_eq!(buf.len(), value_len(&value));
    }

    /// Any strict prefix of a non-empty encoding is rejected, never misread.
    #[test]
    fn truncated_records_are_rejected(
        values in prop::collection::vec(value_strategy(), 1..8),
        cut in 1usize..64,
    ) {
        let bytes = Row::new(values).encode().unwrap();
        let cut = cut.min(bytes.len());
        prop_assert!(Row::decode(&bytes[..bytes.len() - cut]).is_err());
    }
}
