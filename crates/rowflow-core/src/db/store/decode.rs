use crate::{
    db::{
        codec::decode_value_columns,
        row::{EncDatum, Row},
        store::{KvEntry, TableDescriptor, key::split_index_columns},
    },
    error::InternalError,
    types::ColumnType,
};

///
/// RowDecoder
///
/// Materializes primary entries of one table into full rows.
/// Key columns stay key-encoded until first read; value columns are
/// decoded eagerly because they share one payload.
///

#[derive(Clone, Debug)]
pub struct RowDecoder {
    table: TableDescriptor,
    types: Vec<ColumnType>,
    value_column_ids: Vec<usize>,
}

impl RowDecoder {
    #[must_use]
    pub fn new(table: TableDescriptor) -> Self {
        let types = table.column_types();
        let value_column_ids = table.value_column_ids();

        Self {
            table,
            types,
            value_column_ids,
        }
    }

    /// Column types of decoded rows: the table's full column set.
    #[must_use]
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    #[must_use]
    pub const fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn decode(&self, entry: &KvEntry) -> Result<Row, InternalError> {
        let index = &self.table.primary_index;
        let (segments, rest) = split_index_columns(&self.table, index, &entry.key)?;
        if !rest.is_empty() {
            return Err(InternalError::codec_corruption(format!(
                "primary key of table '{}' has {} trailing bytes",
                self.table.name,
                rest.len()
            )));
        }

        let values = decode_value_columns(&entry.value)?;
        if values.len() != self.value_column_ids.len() {
            return Err(InternalError::codec_corruption(format!(
                "stored row of table '{}' has {} value columns, expected {}",
                self.table.name,
                values.len(),
                self.value_column_ids.len()
            )));
        }

        let mut datums = vec![EncDatum::null(); self.types.len()];
        for (segment, &col) in segments.into_iter().zip(&index.column_ids) {
            datums[col] = EncDatum::from_key_segment(segment);
        }
        for (value, &col) in values.into_iter().zip(&self.value_column_ids) {
            if !self.types[col].admits(&value) {
                return Err(InternalError::codec_corruption(format!(
                    "stored value {value} does not fit column '{}' ({})",
                    self.table.columns[col].name, self.types[col]
                )));
            }
            datums[col] = EncDatum::from_value(value);
        }

        Ok(Row::new(datums))
    }
}
