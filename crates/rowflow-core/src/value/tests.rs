use crate::value::{Value, canonical_cmp, numeric_cmp};
use std::cmp::Ordering;

#[test]
fn canonical_cmp_puts_null_first() {
    assert_eq!(canonical_cmp(&Value::Null, &Value::Int(-5)), Ordering::Less);
    assert_eq!(
        canonical_cmp(&Value::Text(String::new()), &Value::Null),
        Ordering::Greater
    );
    assert_eq!(canonical_cmp(&Value::Null, &Value::Null), Ordering::Equal);
}

#[test]
fn canonical_cmp_compares_numeric_variants_by_magnitude() {
    assert_eq!(canonical_cmp(&Value::Int(1), &Value::Uint(1)), Ordering::Equal);
    assert_eq!(canonical_cmp(&Value::Int(-1), &Value::Uint(0)), Ordering::Less);
    assert_eq!(
        canonical_cmp(&Value::Float(2.5), &Value::Int(2)),
        Ordering::Greater
    );
}

#[test]
fn canonical_cmp_orders_mixed_variants_by_rank() {
    assert_eq!(
        canonical_cmp(&Value::Bool(true), &Value::Int(0)),
        Ordering::Less
    );
    assert_eq!(
        canonical_cmp(&Value::Text("a".into()), &Value::Bytes(vec![0])),
        Ordering::Less
    );
}

#[test]
fn numeric_cmp_rejects_non_numeric() {
    assert_eq!(numeric_cmp(&Value::Text("1".into()), &Value::Int(1)), None);
    assert_eq!(
        numeric_cmp(&Value::Uint(u64::MAX), &Value::Int(i64::MAX)),
        Some(Ordering::Greater)
    );
}

#[test]
fn display_matches_row_rendering() {
    assert_eq!(Value::Int(-3).to_string(), "-3");
    assert_eq!(Value::Text("two-one".into()).to_string(), "'two-one'");
    assert_eq!(Value::Null.to_string(), "NULL");
    assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_string(), "b'ab01'");
}
