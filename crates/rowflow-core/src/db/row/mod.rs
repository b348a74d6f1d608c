//! Module: db::row
//! Responsibility: the row representation shared by every operator and the
//! ordering used to compare rows.
//! Does not own: how rows are stored or looked up.

mod datum;
mod ordering;


pub use datum::EncDatum;
pub use ordering::{ColumnOrderInfo, ColumnOrdering};

use crate::{error::InternalError, types::ColumnType, value::Value};
use derive_more::{Deref, DerefMut, IntoIterator};
use std::{cmp::Ordering, fmt::Write as _};

///
/// Row
///
/// Ordered sequence of datums. Every row of one stream has the same arity
/// and column types; the types travel with the stream, not the row.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, IntoIterator)]
pub struct Row(Vec<EncDatum>);

impl Row {
    #[must_use]
    pub const fn new(datums: Vec<EncDatum>) -> Self {
        Self(datums)
    }

    /// Build a row of decoded values.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self(values.into_iter().map(EncDatum::from_value).collect())
    }

    /// Compare two rows restricted to the ordering columns.
    pub fn compare(
        &self,
        types: &[ColumnType],
        ordering: &ColumnOrdering,
        other: &Self,
    ) -> Result<Ordering, InternalError> {
        for info in ordering.iter() {
            let (Some(left), Some(right), Some(ty)) = (
                self.get(info.col_idx),
                other.get(info.col_idx),
                types.get(info.col_idx),
            ) else {
                return Err(InternalError::stream_invariant(format!(
                    "ordering column {} out of range for row of {} columns",
                    info.col_idx,
                    self.len()
                )));
            };

            let cmp = info.direction_adjust(left.compare(*ty, right)?);
            if cmp != Ordering::Equal {
                return Ok(cmp);
            }
        }

        Ok(Ordering::Equal)
    }

    /// Decode every datum into native values.
    pub fn values(&self, types: &[ColumnType]) -> Result<Vec<Value>, InternalError> {
        self.iter()
            .zip(types)
            .map(|(datum, ty)| datum.ensure_decoded(*ty).cloned())
            .collect()
    }

    /// Render as `[v1 v2 ...]`; undecodable datums render as `?`.
    #[must_use]
    pub fn render(&self, types: &[ColumnType]) -> String {
        let mut out = String::from("[");
        for (idx, (datum, ty)) in self.iter().zip(types).enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            match datum.ensure_decoded(*ty) {
                Ok(value) => {
                    let _ = write!(out, "{value}");
                }
                Err(_) => out.push('?'),
            }
        }
        out.push(']');

        out
    }
}

impl FromIterator<EncDatum> for Row {
    fn from_iter<T: IntoIterator<Item = EncDatum>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render a row sequence as `[[..] [..]]`.
#[must_use]
pub fn render_rows(rows: &[Row], types: &[ColumnType]) -> String {
    let rendered = rows
        .iter()
        .map(|row| row.render(types))
        .collect::<Vec<_>>()
        .join(" ");

    format!("[{rendered}]")
}
