//! Module: db::executor
//! Responsibility: streaming processors and the row source/sink protocol they share.
//! Does not own: key layout, row decoding, expression evaluation.
//! Boundary: processors pull from a `RowSource` and push into a `RowSink`.

mod buffer;
mod distinct;
mod drain;
mod group;
mod join;
mod post;
mod stream;

pub use buffer::{RowBuffer, RowBufferArgs};
pub use distinct::SortedDistinct;
pub use drain::drain_and_forward_metadata;
pub use group::StreamGroupAccumulator;
pub use join::{JoinReader, JoinReaderSpec, JoinType};
pub use post::{PostProcessSpec, ProcOutputHelper};
pub use stream::{
    ConsumerStatus, MetadataStash, NoMetadataRowSource, ProducerMetadata, RowSink, RowSource,
    StreamItem,
};

// Design notes:
// - Processors are synchronous pull-then-push loops; backpressure is the
//   `ConsumerStatus` returned by every push.
// - Data errors never unwind out of `Processor::run`; they travel downstream
//   as error metadata and the processor drains.
// - Protocol misuse (pushing after `producer_done`) is a programming error
//   and panics.

///
/// Processor
///
/// One streaming operator wired to its input and output at construction.
/// `run` drives it to completion and calls `producer_done` exactly once.
///

pub trait Processor {
    fn run(&mut self);
}
