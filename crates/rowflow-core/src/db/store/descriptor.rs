use crate::{error::InternalError, types::ColumnType};
use serde::{Deserialize, Serialize};

///
/// ColumnDescriptor
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: ColumnType,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

///
/// IndexDescriptor
///
/// Ordered list of table column positions forming an index key.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexDescriptor {
    pub id: u32,
    pub name: String,
    pub column_ids: Vec<usize>,
}

impl IndexDescriptor {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, column_ids: Vec<usize>) -> Self {
        Self {
            id,
            name: name.into(),
            column_ids,
        }
    }
}

///
/// TableDescriptor
///
/// Schema of one stored table: its columns, the primary index whose entries
/// hold the rows, and secondary indexes whose entries point at primary keys.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableDescriptor {
    pub id: u32,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_index: IndexDescriptor,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    #[must_use]
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|column| column.ty).collect()
    }

    /// Resolve an index by id; `None` selects the primary index.
    pub fn index(&self, index_id: Option<u32>) -> Result<&IndexDescriptor, InternalError> {
        let Some(id) = index_id else {
            return Ok(&self.primary_index);
        };
        if id == self.primary_index.id {
            return Ok(&self.primary_index);
        }

        self.indexes
            .iter()
            .find(|index| index.id == id)
            .ok_or_else(|| {
                InternalError::executor_unsupported(format!(
                    "table '{}' has no index with id {id}",
                    self.name
                ))
            })
    }

    #[must_use]
    pub fn is_primary(&self, index: &IndexDescriptor) -> bool {
        index.id == self.primary_index.id
    }

    /// Column types of an index key, in index order.
    #[must_use]
    pub fn index_column_types(&self, index: &IndexDescriptor) -> Vec<ColumnType> {
        index
            .column_ids
            .iter()
            .map(|&col| self.columns[col].ty)
            .collect()
    }

    /// Positions of columns stored in the primary entry value, ascending.
    #[must_use]
    pub fn value_column_ids(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|col| !self.primary_index.column_ids.contains(col))
            .collect()
    }

    /// Check internal consistency: ids unique, index columns in range and
    /// never nullable.
    pub fn validate(&self) -> Result<(), InternalError> {
        let mut seen = vec![self.primary_index.id];
        for index in &self.indexes {
            if seen.contains(&index.id) {
                return Err(InternalError::executor_invariant(format!(
                    "table '{}' declares index id {} twice",
                    self.name, index.id
                )));
            }
            seen.push(index.id);
        }

        for index in std::iter::once(&self.primary_index).chain(&self.indexes) {
            if index.column_ids.is_empty() {
                return Err(InternalError::executor_invariant(format!(
                    "index '{}' has no columns",
                    index.name
                )));
            }
            if let Some(col) = index
                .column_ids
                .iter()
                .find(|&&col| col >= self.columns.len())
            {
                return Err(InternalError::executor_invariant(format!(
                    "index '{}' references column {col} of a {}-column table",
                    index.name,
                    self.columns.len()
                )));
            }
        }

        if let Some(&col) = self
            .primary_index
            .column_ids
            .iter()
            .find(|&&col| self.columns[col].nullable)
        {
            return Err(InternalError::executor_invariant(format!(
                "primary key column '{}' must not be nullable",
                self.columns[col].name
            )));
        }

        for index in &self.indexes {
            if let Some(&col) = index
                .column_ids
                .iter()
                .find(|&&col| self.columns[col].nullable)
            {
                return Err(InternalError::executor_invariant(format!(
                    "index '{}' column '{}' must not be nullable",
                    index.name, self.columns[col].name
                )));
            }
        }

        Ok(())
    }
}
