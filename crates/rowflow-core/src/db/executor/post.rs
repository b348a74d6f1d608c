use crate::{
    db::{
        executor::stream::{ConsumerStatus, RowSink, StreamItem},
        expr::Expr,
        row::Row,
    },
    error::InternalError,
    obs::{MetricsEvent, OperatorKind, sink::record},
    types::ColumnType,
};
use serde::{Deserialize, Serialize};

///
/// PostProcessSpec
///
/// Output shaping applied by a processor to every row it produces:
/// filter, offset, projection, then limit. `limit == 0` means unlimited.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostProcessSpec {
    /// Filter expression over the unprojected row; `@1` is column 0.
    pub filter: Option<String>,
    pub projection: Option<Vec<usize>>,
    pub offset: u64,
    pub limit: u64,
}

///
/// ProcOutputHelper
///
/// Compiled form of a `PostProcessSpec` bound to one input row shape.
///

#[derive(Debug)]
pub struct ProcOutputHelper {
    operator: OperatorKind,
    filter: Option<Expr>,
    projection: Option<Vec<usize>>,
    input_types: Vec<ColumnType>,
    output_types: Vec<ColumnType>,
    offset: u64,
    limit: u64,
    skipped: u64,
    emitted: u64,
}

impl ProcOutputHelper {
    pub fn new(
        spec: &PostProcessSpec,
        input_types: &[ColumnType],
        operator: OperatorKind,
    ) -> Result<Self, InternalError> {
        let filter = match spec.filter.as_deref() {
            Some(text) => {
                let expr = Expr::parse(text)?;
                expr.validate_columns(input_types.len())?;
                Some(expr)
            }
            None => None,
        };

        let output_types = match &spec.projection {
            Some(cols) => cols
                .iter()
                .map(|&col| {
                    input_types.get(col).copied().ok_or_else(|| {
                        InternalError::executor_unsupported(format!(
                            "projection column {col} out of range for {} input columns",
                            input_types.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => input_types.to_vec(),
        };

        Ok(Self {
            operator,
            filter,
            projection: spec.projection.clone(),
            input_types: input_types.to_vec(),
            output_types,
            offset: spec.offset,
            limit: spec.limit,
            skipped: 0,
            emitted: 0,
        })
    }

    #[must_use]
    pub fn output_types(&self) -> &[ColumnType] {
        &self.output_types
    }

    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Shape one row and push it.
    ///
    /// Rows rejected by the filter or skipped by the offset answer
    /// `NeedMoreRows` without touching `output`. Reaching the limit answers
    /// at least `DrainRequested`.
    pub fn emit_row<O>(&mut self, row: Row, output: &mut O) -> Result<ConsumerStatus, InternalError>
    where
        O: RowSink + ?Sized,
    {
        if let Some(filter) = &self.filter
            && !filter.eval_filter(&row, &self.input_types)?
        {
            record(MetricsEvent::RowsFiltered {
                operator: self.operator,
                rows: 1,
            });
            return Ok(ConsumerStatus::NeedMoreRows);
        }

        if self.skipped < self.offset {
            self.skipped += 1;
            return Ok(ConsumerStatus::NeedMoreRows);
        }

        let row = match &self.projection {
            Some(cols) => cols.iter().map(|&col| row[col].clone()).collect::<Row>(),
            None => row,
        };

        let status = output.push(StreamItem::Row(row));
        self.emitted += 1;
        record(MetricsEvent::RowsEmitted {
            operator: self.operator,
            rows: 1,
        });

        if self.limit > 0 && self.emitted >= self.limit {
            return Ok(status.max(ConsumerStatus::DrainRequested));
        }

        Ok(status)
    }
}

///
/// TESTS
///
