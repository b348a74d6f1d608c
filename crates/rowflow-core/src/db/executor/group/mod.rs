#[cfg(test)]
mod tests;

use crate::{
    db::{
        executor::stream::NoMetadataRowSource,
        row::{ColumnOrdering, Row},
    },
    error::InternalError,
    obs::{MetricsEvent, sink::record},
    types::ColumnType,
};
use std::cmp::Ordering;

///
/// StreamGroupAccumulator
///
/// Splits a source already sorted on `ordering` into maximal runs of rows
/// that compare equal on it. Rows are never reordered.
///
/// The accumulator owns the current group until `advance_group` hands it
/// over as an exact-length vector; the internal buffer keeps its capacity
/// for the next group.
///

pub struct StreamGroupAccumulator<S> {
    src: S,
    types: Vec<ColumnType>,
    ordering: ColumnOrdering,
    src_consumed: bool,
    cur_group: Vec<Row>,
}

impl<S: NoMetadataRowSource> StreamGroupAccumulator<S> {
    pub fn new(src: S, ordering: ColumnOrdering, capacity: usize) -> Self {
        let types = src.types().to_vec();

        Self {
            src,
            types,
            ordering,
            src_consumed: false,
            cur_group: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// No further rows will be pulled: the source ended or failed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.src_consumed
    }

    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.src
    }

    /// First row of the current group, pulling one row to seed an empty
    /// group. `None` once the source is exhausted. Repeated calls without
    /// an intervening `advance_group` return the same row.
    pub fn peek_at_current_group(&mut self) -> Result<Option<&Row>, InternalError> {
        if self.src_consumed {
            return Ok(None);
        }
        if self.cur_group.is_empty() {
            match self.pull()? {
                Some(row) => self.cur_group.push(row),
                None => {
                    self.src_consumed = true;
                    return Ok(None);
                }
            }
        }

        Ok(self.cur_group.first())
    }

    /// Hand over every row of the current group and advance, so that the
    /// next `peek_at_current_group` sees the first row of the next group.
    pub fn advance_group(&mut self) -> Result<Option<Vec<Row>>, InternalError> {
        if self.src_consumed {
            return Ok(None);
        }

        loop {
            let Some(row) = self.pull()? else {
                self.src_consumed = true;
                return Ok(self.hand_over());
            };

            let Some(first) = self.cur_group.first() else {
                self.cur_group.push(row);
                continue;
            };

            match first.compare(&self.types, &self.ordering, &row) {
                Ok(Ordering::Equal) => self.cur_group.push(row),
                Ok(Ordering::Less) => {
                    let group = self.hand_over();
                    self.cur_group.push(row);
                    return Ok(group);
                }
                Ok(Ordering::Greater) => {
                    let err = InternalError::ordering_violation(
                        first.render(&self.types),
                        row.render(&self.types),
                    );
                    record(MetricsEvent::OrderingViolation);
                    return Err(self.fail(err));
                }
                Err(err) => return Err(self.fail(err)),
            }
        }
    }

    fn pull(&mut self) -> Result<Option<Row>, InternalError> {
        self.src.next_row().map_err(|err| self.fail(err))
    }

    // The source must not be called again after an error.
    fn fail(&mut self, err: InternalError) -> InternalError {
        self.src_consumed = true;
        self.cur_group.clear();
        err
    }

    fn hand_over(&mut self) -> Option<Vec<Row>> {
        if self.cur_group.is_empty() {
            return None;
        }

        let group: Vec<Row> = self.cur_group.drain(..).collect();
        record(MetricsEvent::GroupEmitted {
            rows: u64::try_from(group.len()).unwrap_or(u64::MAX),
        });

        Some(group)
    }
}
