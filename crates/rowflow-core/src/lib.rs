//! Streaming row operators for a distributed SQL execution engine: a
//! batched lookup join reader, a sorted-stream group accumulator, and the
//! producer/consumer protocol they share.
//!
//! Processors never install a logger; they log through the `log` facade.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod obs;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains the vocabulary needed to wire a processor.
///

pub mod prelude {
    pub use crate::{
        config::ExecConfig,
        db::{
            Processor,
            executor::{
                ConsumerStatus, JoinReader, JoinReaderSpec, JoinType, PostProcessSpec,
                ProducerMetadata, RowSink, RowSource, SortedDistinct, StreamItem,
            },
            row::{ColumnOrdering, EncDatum, Row},
            store::{KvLookup, MemoryStore, TableDescriptor},
        },
        error::InternalError,
        types::ColumnType,
        value::Value,
    };
}
