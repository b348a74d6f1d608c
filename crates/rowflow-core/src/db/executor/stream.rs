use crate::{
    db::{row::Row, store::RangeInfo},
    error::InternalError,
    types::ColumnType,
};
use std::collections::VecDeque;

///
/// ProducerMetadata
///
/// Side-channel item travelling alongside rows: an error, range placement
/// observations, or both.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProducerMetadata {
    pub err: Option<InternalError>,
    pub ranges: Vec<RangeInfo>,
}

impl ProducerMetadata {
    #[must_use]
    pub const fn from_error(err: InternalError) -> Self {
        Self {
            err: Some(err),
            ranges: Vec::new(),
        }
    }

    #[must_use]
    pub const fn from_ranges(ranges: Vec<RangeInfo>) -> Self {
        Self { err: None, ranges }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.err.is_some()
    }
}

///
/// StreamItem
///

#[derive(Clone, Debug)]
pub enum StreamItem {
    Row(Row),
    Meta(ProducerMetadata),
}

///
/// ConsumerStatus
///
/// Answer of a sink to every push. Variants are ordered by severity so two
/// statuses combine with `max`.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ConsumerStatus {
    /// Keep sending rows and metadata.
    #[default]
    NeedMoreRows,

    /// Stop sending rows; keep forwarding metadata until the input ends.
    DrainRequested,

    /// Stop everything; nothing more may be pushed.
    ConsumerClosed,
}

///
/// RowSource
///
/// Metadata-aware pull stream. `None` marks the end of the stream; once
/// returned, every later `next` returns `None` as well.
///

pub trait RowSource {
    fn types(&self) -> &[ColumnType];

    fn next(&mut self) -> Option<StreamItem>;

    /// The consumer wants no more rows; metadata still flows.
    fn consumer_done(&mut self);

    /// The consumer wants nothing more at all.
    fn consumer_closed(&mut self);
}

impl<T> RowSource for &mut T
where
    T: RowSource + ?Sized,
{
    fn types(&self) -> &[ColumnType] {
        (**self).types()
    }

    fn next(&mut self) -> Option<StreamItem> {
        (**self).next()
    }

    fn consumer_done(&mut self) {
        (**self).consumer_done();
    }

    fn consumer_closed(&mut self) {
        (**self).consumer_closed();
    }
}

///
/// NoMetadataRowSource
///
/// Metadata-free pull stream. After an `Err` the source must not be
/// called again.
///

pub trait NoMetadataRowSource {
    fn types(&self) -> &[ColumnType];

    fn next_row(&mut self) -> Result<Option<Row>, InternalError>;
}

impl<T> NoMetadataRowSource for &mut T
where
    T: NoMetadataRowSource + ?Sized,
{
    fn types(&self) -> &[ColumnType] {
        (**self).types()
    }

    fn next_row(&mut self) -> Result<Option<Row>, InternalError> {
        (**self).next_row()
    }
}

///
/// RowSink
///

pub trait RowSink {
    fn push(&mut self, item: StreamItem) -> ConsumerStatus;

    /// Signal the end of the stream. Called exactly once.
    fn producer_done(&mut self);
}

impl<T> RowSink for &mut T
where
    T: RowSink + ?Sized,
{
    fn push(&mut self, item: StreamItem) -> ConsumerStatus {
        (**self).push(item)
    }

    fn producer_done(&mut self) {
        (**self).producer_done();
    }
}

///
/// MetadataStash
///
/// Adapter exposing a `RowSource` as a `NoMetadataRowSource`.
/// Error metadata becomes `Err`; any other metadata is stashed in arrival
/// order, tagged with the number of rows returned before it, for the
/// owning processor to forward.
///

pub struct MetadataStash<S> {
    source: S,
    stashed: VecDeque<(u64, ProducerMetadata)>,
    rows_returned: u64,
}

impl<S: RowSource> MetadataStash<S> {
    pub const fn new(source: S) -> Self {
        Self {
            source,
            stashed: VecDeque::new(),
            rows_returned: 0,
        }
    }

    /// Take every metadata item stashed so far, oldest first.
    pub fn take_metadata(&mut self) -> Vec<ProducerMetadata> {
        self.stashed.drain(..).map(|(_, meta)| meta).collect()
    }

    /// Take the metadata that arrived before row `rows + 1`, oldest first.
    pub fn take_metadata_up_to(&mut self, rows: u64) -> Vec<ProducerMetadata> {
        let count = self
            .stashed
            .iter()
            .take_while(|(before, _)| *before <= rows)
            .count();

        self.stashed.drain(..count).map(|(_, meta)| meta).collect()
    }

    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn stash(&mut self, meta: ProducerMetadata) {
        self.stashed.push_back((self.rows_returned, meta));
    }
}

impl<S: RowSource> NoMetadataRowSource for MetadataStash<S> {
    fn types(&self) -> &[ColumnType] {
        self.source.types()
    }

    fn next_row(&mut self) -> Result<Option<Row>, InternalError> {
        loop {
            match self.source.next() {
                None => return Ok(None),
                Some(StreamItem::Row(row)) => {
                    self.rows_returned += 1;
                    return Ok(Some(row));
                }
                Some(StreamItem::Meta(meta)) => match meta.err {
                    Some(err) => {
                        if !meta.ranges.is_empty() {
                            self.stash(ProducerMetadata::from_ranges(meta.ranges));
                        }
                        return Err(err);
                    }
                    None => self.stash(meta),
                },
            }
        }
    }
}

///
/// TESTS
///
