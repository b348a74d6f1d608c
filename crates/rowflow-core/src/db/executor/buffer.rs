use crate::{
    db::{
        executor::stream::{ConsumerStatus, ProducerMetadata, RowSink, RowSource, StreamItem},
        row::Row,
    },
    types::ColumnType,
};
use std::collections::VecDeque;

///
/// RowBufferArgs
///

#[derive(Clone, Copy, Debug, Default)]
pub struct RowBufferArgs {
    /// Keep recording pushed rows after the consumer asked for a drain.
    pub accumulate_rows_while_draining: bool,
}

///
/// RowBuffer
///
/// In-memory stream usable as both a source and a sink.
/// As a sink it records everything pushed into it and answers with a
/// status the test controls through `consumer_done` / `consumer_closed`.
/// As a source it replays its records and flags `done` at the end.
///

#[derive(Debug)]
pub struct RowBuffer {
    types: Vec<ColumnType>,
    records: VecDeque<StreamItem>,
    args: RowBufferArgs,
    status: ConsumerStatus,
    done: bool,
    producer_closed: bool,
    closed_returned: bool,
    pulls: usize,
}

impl RowBuffer {
    #[must_use]
    pub fn new(types: Vec<ColumnType>, rows: Vec<Row>, args: RowBufferArgs) -> Self {
        Self {
            types,
            records: rows.into_iter().map(StreamItem::Row).collect(),
            args,
            status: ConsumerStatus::NeedMoreRows,
            done: false,
            producer_closed: false,
            closed_returned: false,
            pulls: 0,
        }
    }

    /// An empty sink with no declared column types.
    #[must_use]
    pub fn sink() -> Self {
        Self::new(Vec::new(), Vec::new(), RowBufferArgs::default())
    }

    /// Source side was read to the end.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Sink side received `producer_done`.
    #[must_use]
    pub const fn is_producer_closed(&self) -> bool {
        self.producer_closed
    }

    #[must_use]
    pub const fn consumer_status(&self) -> ConsumerStatus {
        self.status
    }

    /// Number of `next` calls served as a source.
    #[must_use]
    pub const fn pulls(&self) -> usize {
        self.pulls
    }

    pub fn take_records(&mut self) -> Vec<StreamItem> {
        self.records.drain(..).collect()
    }

    /// Split the recorded items into rows and metadata, each in push order.
    pub fn split_records(&mut self) -> (Vec<Row>, Vec<ProducerMetadata>) {
        let mut rows = Vec::new();
        let mut metadata = Vec::new();
        for item in self.records.drain(..) {
            match item {
                StreamItem::Row(row) => rows.push(row),
                StreamItem::Meta(meta) => metadata.push(meta),
            }
        }

        (rows, metadata)
    }
}

impl RowSink for RowBuffer {
    fn push(&mut self, item: StreamItem) -> ConsumerStatus {
        assert!(
            !self.producer_closed,
            "push after producer_done on RowBuffer"
        );
        assert!(
            !self.closed_returned,
            "push after the consumer reported ConsumerClosed"
        );

        let keep = match &item {
            StreamItem::Meta(_) => true,
            StreamItem::Row(_) => {
                self.status == ConsumerStatus::NeedMoreRows
                    || self.args.accumulate_rows_while_draining
            }
        };
        if keep {
            self.records.push_back(item);
        }
        if self.status == ConsumerStatus::ConsumerClosed {
            self.closed_returned = true;
        }

        self.status
    }

    fn producer_done(&mut self) {
        assert!(!self.producer_closed, "producer_done called twice");
        self.producer_closed = true;
    }
}

impl RowSource for RowBuffer {
    fn types(&self) -> &[ColumnType] {
        &self.types
    }

    fn next(&mut self) -> Option<StreamItem> {
        self.pulls += 1;
        let item = self.records.pop_front();
        if item.is_none() {
            self.done = true;
        }

        item
    }

    fn consumer_done(&mut self) {
        self.status = self.status.max(ConsumerStatus::DrainRequested);
    }

    fn consumer_closed(&mut self) {
        self.status = ConsumerStatus::ConsumerClosed;
    }
}

///
/// TESTS
///
