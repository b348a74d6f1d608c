use crate::{
    db::store::{
        KvEntry, KvLookup, LookupRequest, LookupResponse, RangeInfo, TableDescriptor,
        key::{primary_key, secondary_key},
    },
    db::codec::{decode_value_columns, encode_value_columns},
    error::InternalError,
    value::Value,
};
use derive_more::Deref;
use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Included, Unbounded},
};

///
/// MemoryStore
///
/// Ordered in-memory key-value store with optional range placement.
/// Rows are written through `insert_row`, which maintains every index.
///

#[derive(Debug, Default, Deref)]
pub struct MemoryStore {
    #[deref]
    entries: BTreeMap<Vec<u8>, Vec<u8>>,

    // range start key -> lease holder; empty means placement is not reported
    ranges: BTreeMap<Vec<u8>, u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a range at `start_key` leased to `lease_holder`.
    /// The first call also covers every key below `start_key` with the same holder.
    pub fn split_range(&mut self, start_key: Vec<u8>, lease_holder: u64) {
        if self.ranges.is_empty() {
            self.ranges.insert(Vec::new(), lease_holder);
        }
        self.ranges.insert(start_key, lease_holder);
    }

    /// Write one table row and all of its index entries.
    ///
    /// Every key is built before the first write, so a rejected row leaves
    /// the store untouched. Replacing a row drops its old secondary entries.
    pub fn insert_row(
        &mut self,
        table: &TableDescriptor,
        values: &[Value],
    ) -> Result<(), InternalError> {
        table.validate()?;
        if values.len() != table.columns.len() {
            return Err(InternalError::store_internal(format!(
                "row has {} values but table '{}' has {} columns",
                values.len(),
                table.name,
                table.columns.len()
            )));
        }
        for (value, column) in values.iter().zip(&table.columns) {
            if !column.ty.admits(value) || (value.is_null() && !column.nullable) {
                return Err(InternalError::store_internal(format!(
                    "value {value} does not fit column '{}' ({})",
                    column.name, column.ty
                )));
            }
        }

        let value_column_ids = table.value_column_ids();
        let value_columns = value_column_ids
            .iter()
            .map(|&col| values[col].clone())
            .collect::<Vec<_>>();
        let key = primary_key(table, values)?;
        let payload = encode_value_columns(&value_columns)?;
        let index_keys = secondary_keys(table, values)?;

        let stale_keys = match self.entries.get(&key) {
            Some(old_payload) => {
                let mut old_values = values.to_vec();
                let old_columns = decode_value_columns(old_payload)?;
                if old_columns.len() != value_column_ids.len() {
                    return Err(InternalError::codec_corruption(format!(
                        "stored row of table '{}' has {} value columns, expected {}",
                        table.name,
                        old_columns.len(),
                        value_column_ids.len()
                    )));
                }
                for (value, &col) in old_columns.into_iter().zip(&value_column_ids) {
                    old_values[col] = value;
                }
                secondary_keys(table, &old_values)?
            }
            None => Vec::new(),
        };

        for stale in stale_keys {
            self.entries.remove(&stale);
        }
        self.entries.insert(key, payload);
        for index_key in index_keys {
            self.entries.insert(index_key, Vec::new());
        }

        Ok(())
    }

    /// Write a raw entry, bypassing row encoding.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn range_for(&self, key: &[u8]) -> Option<RangeInfo> {
        let (start, holder) = self
            .ranges
            .range::<[u8], _>((Unbounded, Included(key)))
            .next_back()?;
        let end_key = self
            .ranges
            .range::<[u8], _>((Excluded(start.as_slice()), Unbounded))
            .next()
            .map(|(end, _)| end.clone());

        Some(RangeInfo {
            start_key: start.clone(),
            end_key,
            lease_holder: *holder,
        })
    }
}

// One secondary key per table index, in declaration order.
fn secondary_keys(
    table: &TableDescriptor,
    values: &[Value],
) -> Result<Vec<Vec<u8>>, InternalError> {
    table
        .indexes
        .iter()
        .map(|index| secondary_key(table, index, values))
        .collect()
}

impl KvLookup for MemoryStore {
    fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse, InternalError> {
        let mut response = LookupResponse {
            results: Vec::with_capacity(request.spans.len()),
            ranges: Vec::new(),
        };

        for span in &request.spans {
            let end = span
                .end
                .as_deref()
                .map_or(Unbounded, Excluded);
            let entries = self
                .entries
                .range::<[u8], _>((Included(span.start.as_slice()), end))
                .map(|(key, value)| KvEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect::<Vec<_>>();

            for entry in &entries {
                if let Some(range) = self.range_for(&entry.key)
                    && !response.ranges.contains(&range)
                {
                    response.ranges.push(range);
                }
            }
            response.results.push(entries);
        }

        Ok(response)
    }
}
