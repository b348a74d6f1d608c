use crate::value::Value;
use std::cmp::Ordering;

/// Total canonical comparator used by row ordering and key encoding.
///
/// Ordering rules:
/// 1. Canonical variant rank (NULL first, then bool, numeric, text, bytes)
/// 2. Variant-specific comparison for same-ranked values
///
/// Numeric variants share a rank and compare by magnitude, so `Int(1)`
/// and `Uint(1)` are equal under this ordering.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = left.canonical_rank().cmp(&right.canonical_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    canonical_cmp_same_rank(left, right)
}

/// Numeric comparator across `Int`, `Uint`, and `Float`.
///
/// Returns `None` when either side is not numeric.
#[must_use]
pub fn numeric_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    #[allow(clippy::cast_precision_loss)]
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
        (Value::Int(a), Value::Uint(b)) => i128::from(*a).cmp(&i128::from(*b)),
        (Value::Uint(a), Value::Int(b)) => i128::from(*a).cmp(&i128::from(*b)),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
        (Value::Float(a), Value::Uint(b)) => a.total_cmp(&(*b as f64)),
        (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
        (Value::Uint(a), Value::Float(b)) => (*a as f64).total_cmp(b),
        _ => return None,
    };

    Some(ordering)
}

fn canonical_cmp_same_rank(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => numeric_cmp(left, right).unwrap_or(Ordering::Equal),
    }
}
