#[cfg(test)]
mod tests;

use crate::{
    config::ExecConfig,
    db::{
        executor::{
            Processor,
            drain::drain_and_forward_metadata,
            group::StreamGroupAccumulator,
            post::{PostProcessSpec, ProcOutputHelper},
            stream::{ConsumerStatus, MetadataStash, ProducerMetadata, RowSink, RowSource, StreamItem},
        },
        row::{ColumnOrdering, Row},
    },
    error::InternalError,
    obs::{OperatorKind, sink::Span},
    types::ColumnType,
};
use log::{debug, warn};

const OPERATOR: OperatorKind = OperatorKind::SortedDistinct;

///
/// SortedDistinct
///
/// Emits the first row of every run of rows that are equal on the
/// distinct columns. The input must already be sorted on them.
///

pub struct SortedDistinct<I, O> {
    groups: StreamGroupAccumulator<MetadataStash<I>>,
    helper: ProcOutputHelper,
    output: O,
    finished: bool,

    // input rows handed over in groups so far
    rows_seen: u64,
}

impl<I, O> SortedDistinct<I, O>
where
    I: RowSource,
    O: RowSink,
{
    pub fn new(
        config: ExecConfig,
        distinct_columns: ColumnOrdering,
        post: &PostProcessSpec,
        input: I,
        output: O,
    ) -> Result<Self, InternalError> {
        config.validate()?;

        let arity = input.types().len();
        if distinct_columns.is_empty() {
            return Err(InternalError::executor_unsupported(
                "sorted distinct needs at least one column",
            ));
        }
        if let Some(info) = distinct_columns.iter().find(|info| info.col_idx >= arity) {
            return Err(InternalError::executor_unsupported(format!(
                "distinct column {} out of range for {arity} input columns",
                info.col_idx
            )));
        }

        let helper = ProcOutputHelper::new(post, input.types(), OPERATOR)?;
        let groups = StreamGroupAccumulator::new(
            MetadataStash::new(input),
            distinct_columns,
            config.group_buffer_capacity,
        );

        Ok(Self {
            groups,
            helper,
            output,
            finished: false,
            rows_seen: 0,
        })
    }

    #[must_use]
    pub fn output_types(&self) -> &[ColumnType] {
        self.helper.output_types()
    }

    fn pump(&mut self) -> ConsumerStatus {
        loop {
            let status = match self.groups.advance_group() {
                Ok(Some(group)) => self.emit_group(group),
                Ok(None) => {
                    let status = self.forward_stashed(ConsumerStatus::NeedMoreRows);
                    if status == ConsumerStatus::ConsumerClosed {
                        self.groups.source_mut().source_mut().consumer_closed();
                    }
                    return status;
                }
                Err(err) => {
                    let status = self.forward_stashed(ConsumerStatus::NeedMoreRows);
                    if status == ConsumerStatus::ConsumerClosed {
                        status
                    } else {
                        self.push_error(err)
                    }
                }
            };

            match status {
                ConsumerStatus::NeedMoreRows => {}
                ConsumerStatus::DrainRequested => {
                    debug!("{}: draining input", OPERATOR.label());
                    let status = self.forward_stashed(status);
                    if status == ConsumerStatus::ConsumerClosed {
                        self.groups.source_mut().source_mut().consumer_closed();
                        return status;
                    }
                    return drain_and_forward_metadata(
                        OPERATOR,
                        self.groups.source_mut().source_mut(),
                        &mut self.output,
                    );
                }
                ConsumerStatus::ConsumerClosed => {
                    debug!("{}: consumer closed", OPERATOR.label());
                    self.groups.source_mut().source_mut().consumer_closed();
                    return status;
                }
            }
        }
    }

    // Emit the first row of a group between the metadata that arrived
    // before it and the metadata that arrived with the rest of the group.
    fn emit_group(&mut self, group: Vec<Row>) -> ConsumerStatus {
        let first_row_at = self.rows_seen;
        self.rows_seen = self
            .rows_seen
            .saturating_add(u64::try_from(group.len()).unwrap_or(u64::MAX));

        let metadata = self.groups.source_mut().take_metadata_up_to(first_row_at);
        let mut status = self.forward(metadata, ConsumerStatus::NeedMoreRows);
        if status != ConsumerStatus::NeedMoreRows {
            return status;
        }

        if let Some(row) = group.into_iter().next() {
            status = match self.helper.emit_row(row, &mut self.output) {
                Ok(status) => status,
                Err(err) => self.push_error(err),
            };
        }

        let metadata = self.groups.source_mut().take_metadata_up_to(self.rows_seen);
        self.forward(metadata, status)
    }

    // Push metadata stashed while grouping, unless the consumer is gone.
    fn forward_stashed(&mut self, status: ConsumerStatus) -> ConsumerStatus {
        let metadata = self.groups.source_mut().take_metadata();
        self.forward(metadata, status)
    }

    fn forward(
        &mut self,
        metadata: Vec<ProducerMetadata>,
        mut status: ConsumerStatus,
    ) -> ConsumerStatus {
        for meta in metadata {
            if status == ConsumerStatus::ConsumerClosed {
                break;
            }
            status = status.max(self.output.push(StreamItem::Meta(meta)));
        }

        status
    }

    fn push_error(&mut self, err: InternalError) -> ConsumerStatus {
        warn!(
            "{}: forwarding error as metadata: {}",
            OPERATOR.label(),
            err.display_with_class()
        );
        let status = self
            .output
            .push(StreamItem::Meta(ProducerMetadata::from_error(err)));

        status.max(ConsumerStatus::DrainRequested)
    }
}

impl<I, O> Processor for SortedDistinct<I, O>
where
    I: RowSource,
    O: RowSink,
{
    fn run(&mut self) {
        if self.finished {
            debug!("{}: run called after finish", OPERATOR.label());
            return;
        }

        let _span = Span::new(OPERATOR);
        let status = self.pump();
        self.output.producer_done();
        self.finished = true;

        debug!(
            "{}: finished with {status:?}, {} rows emitted",
            OPERATOR.label(),
            self.helper.emitted()
        );
    }
}
