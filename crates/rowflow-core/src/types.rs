use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ColumnType
///
/// Declared type of one column in a row stream or table.
/// Every datum decoded for a column must either match it or be NULL.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ColumnType {
    Bool,
    Int,
    Uint,
    Float,
    Text,
    Bytes,
}

impl ColumnType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int => "INT",
            Self::Uint => "UINT",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Bytes => "BYTES",
        }
    }

    /// Whether `value` is admissible for this column.
    #[must_use]
    pub const fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Uint, Value::Uint(_))
                | (Self::Float, Value::Float(_))
                | (Self::Text, Value::Text(_))
                | (Self::Bytes, Value::Bytes(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
