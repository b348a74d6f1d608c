use crate::{
    db::{
        codec::{encode_key_segment, key_segment_len},
        row::EncDatum,
        store::{IndexDescriptor, TableDescriptor},
    },
    error::InternalError,
    value::Value,
};

const PREFIX_LEN: usize = 8;

/// `table_id ‖ index_id`, both big-endian.
#[must_use]
pub(crate) fn index_prefix(table_id: u32, index_id: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREFIX_LEN + 16);
    out.extend_from_slice(&table_id.to_be_bytes());
    out.extend_from_slice(&index_id.to_be_bytes());
    out
}

/// Full key of the primary entry for one table row.
pub(crate) fn primary_key(table: &TableDescriptor, values: &[Value]) -> Result<Vec<u8>, InternalError> {
    let mut out = index_prefix(table.id, table.primary_index.id);
    push_index_columns(table, &table.primary_index, values, &mut out)?;

    Ok(out)
}

/// Full key of one secondary entry: index columns followed by the primary
/// key columns, so entries with equal index values stay distinct.
pub(crate) fn secondary_key(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    values: &[Value],
) -> Result<Vec<u8>, InternalError> {
    let mut out = index_prefix(table.id, index.id);
    push_index_columns(table, index, values, &mut out)?;
    push_index_columns(table, &table.primary_index, values, &mut out)?;

    Ok(out)
}

/// Key prefix for a lookup on the leading columns of `index`.
///
/// Returns `None` when a key datum is NULL: NULL never equals a stored key.
pub(crate) fn lookup_prefix(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    key: &[&EncDatum],
) -> Result<Option<Vec<u8>>, InternalError> {
    if key.len() > index.column_ids.len() {
        return Err(InternalError::executor_invariant(format!(
            "lookup key has {} columns but index '{}' has {}",
            key.len(),
            index.name,
            index.column_ids.len()
        )));
    }

    let mut out = index_prefix(table.id, index.id);
    for (datum, &col) in key.iter().zip(&index.column_ids) {
        let ty = table.columns[col].ty;
        if datum.key_bytes().is_none() && datum.ensure_decoded(ty)?.is_null() {
            return Ok(None);
        }
        datum.encode_key(ty, &mut out)?;
    }

    Ok(Some(out))
}

/// Split the index-column segments off a stored key.
/// Returns one byte vector per index column and the remaining suffix.
pub(crate) fn split_index_columns<'a>(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    key: &'a [u8],
) -> Result<(Vec<Vec<u8>>, &'a [u8]), InternalError> {
    let prefix = index_prefix(table.id, index.id);
    let Some(mut rest) = key.strip_prefix(prefix.as_slice()) else {
        return Err(InternalError::store_corruption(format!(
            "key does not belong to index '{}' of table '{}'",
            index.name, table.name
        )));
    };

    let mut segments = Vec::with_capacity(index.column_ids.len());
    for _ in &index.column_ids {
        let len = key_segment_len(rest)?;
        segments.push(rest[..len].to_vec());
        rest = &rest[len..];
    }

    Ok((segments, rest))
}

/// Recover the primary key a secondary entry points at.
pub(crate) fn primary_key_from_secondary(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    key: &[u8],
) -> Result<Vec<u8>, InternalError> {
    let (_, suffix) = split_index_columns(table, index, key)?;
    let mut out = index_prefix(table.id, table.primary_index.id);
    out.extend_from_slice(suffix);

    Ok(out)
}

/// Smallest key greater than every key starting with `prefix`.
/// `None` when no such key exists (all bytes are `0xFF`).
#[must_use]
pub(crate) fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }

    None
}

fn push_index_columns(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    values: &[Value],
    out: &mut Vec<u8>,
) -> Result<(), InternalError> {
    for &col in &index.column_ids {
        encode_key_segment(&values[col], table.columns[col].ty, out)?;
    }

    Ok(())
}
