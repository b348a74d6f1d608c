//! Shared fixtures for operator tests.

use crate::{
    db::{
        row::Row,
        store::{
            ColumnDescriptor, IndexDescriptor, KvLookup, LookupRequest, LookupResponse,
            MemoryStore, TableDescriptor,
        },
    },
    error::InternalError,
    types::ColumnType,
    value::Value,
};
use std::cell::Cell;

pub(crate) const TWO_INTS: [ColumnType; 2] = [ColumnType::Int, ColumnType::Int];
pub(crate) const THREE_INTS: [ColumnType; 3] = [ColumnType::Int, ColumnType::Int, ColumnType::Int];
pub(crate) const ONE_INT: [ColumnType; 1] = [ColumnType::Int];

/// Secondary index `bs (b, s)` of the sum table.
pub(crate) const BS_INDEX_ID: u32 = 2;

const DIGITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Spell a number digit by digit: 21 -> "two-one".
pub(crate) fn int_to_english(n: u64) -> String {
    n.to_string()
        .chars()
        .map(|digit| DIGITS[digit as usize - '0' as usize])
        .collect::<Vec<_>>()
        .join("-")
}

/// `t (a INT, b INT, sum INT, s TEXT, PRIMARY KEY (a, b), INDEX bs (b, s))`.
pub(crate) fn sum_table() -> TableDescriptor {
    TableDescriptor {
        id: 51,
        name: "t".to_string(),
        columns: vec![
            ColumnDescriptor::new("a", ColumnType::Int),
            ColumnDescriptor::new("b", ColumnType::Int),
            ColumnDescriptor::new("sum", ColumnType::Int),
            ColumnDescriptor::new("s", ColumnType::Text),
        ],
        primary_index: IndexDescriptor::new(1, "primary", vec![0, 1]),
        indexes: vec![IndexDescriptor::new(BS_INDEX_ID, "bs", vec![1, 3])],
    }
}

/// Row `id` of the sum table: `(id / 10, id % 10, id / 10 + id % 10, english(id))`.
pub(crate) fn sum_row(id: u64) -> Vec<Value> {
    let a = id / 10;
    let b = id % 10;

    vec![
        Value::Int(a.cast_signed()),
        Value::Int(b.cast_signed()),
        Value::Int((a + b).cast_signed()),
        Value::Text(int_to_english(id)),
    ]
}

/// The sum table populated with row ids `1..=99`.
pub(crate) fn sum_store() -> (TableDescriptor, MemoryStore) {
    let table = sum_table();
    let mut store = MemoryStore::new();
    for id in 1..=99 {
        store.insert_row(&table, &sum_row(id)).expect("fixture row");
    }

    (table, store)
}

/// `t (a INT PRIMARY KEY)` holding the single row `(1)`.
pub(crate) fn single_int_store() -> (TableDescriptor, MemoryStore) {
    let table = TableDescriptor {
        id: 52,
        name: "t".to_string(),
        columns: vec![ColumnDescriptor::new("a", ColumnType::Int)],
        primary_index: IndexDescriptor::new(1, "primary", vec![0]),
        indexes: Vec::new(),
    };
    let mut store = MemoryStore::new();
    store
        .insert_row(&table, &[Value::Int(1)])
        .expect("fixture row");

    (table, store)
}

pub(crate) fn int_row(values: &[i64]) -> Row {
    Row::from_values(values.iter().copied().map(Value::Int))
}

pub(crate) fn int_rows(rows: &[&[i64]]) -> Vec<Row> {
    rows.iter().map(|values| int_row(values)).collect()
}

///
/// FailingLookup
///
/// Lookup collaborator that fails every call and counts the attempts.
///

#[derive(Default)]
pub(crate) struct FailingLookup {
    pub(crate) calls: Cell<usize>,
}

impl KvLookup for FailingLookup {
    fn lookup(&self, _request: &LookupRequest) -> Result<LookupResponse, InternalError> {
        self.calls.set(self.calls.get() + 1);
        Err(InternalError::store_conflict("write intent on lookup span"))
    }
}
