use crate::db::direction::Direction;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// ColumnOrderInfo
///
/// One key part of a column ordering.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnOrderInfo {
    pub col_idx: usize,
    #[serde(default)]
    pub direction: Direction,
}

impl ColumnOrderInfo {
    #[must_use]
    pub const fn asc(col_idx: usize) -> Self {
        Self {
            col_idx,
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub const fn desc(col_idx: usize) -> Self {
        Self {
            col_idx,
            direction: Direction::Desc,
        }
    }

    // Flip an ascending comparison for descending key parts.
    pub(crate) fn direction_adjust(self, cmp: Ordering) -> Ordering {
        match self.direction {
            Direction::Asc => cmp,
            Direction::Desc => cmp.reverse(),
        }
    }
}

///
/// ColumnOrdering
///
/// Ordered key parts defining a total preorder over rows.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColumnOrdering(Vec<ColumnOrderInfo>);

impl ColumnOrdering {
    #[must_use]
    pub const fn new(parts: Vec<ColumnOrderInfo>) -> Self {
        Self(parts)
    }

    /// Ascending ordering over the given columns.
    #[must_use]
    pub fn asc(cols: &[usize]) -> Self {
        Self(cols.iter().copied().map(ColumnOrderInfo::asc).collect())
    }
}
