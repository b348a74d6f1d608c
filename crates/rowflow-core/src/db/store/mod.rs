//! Module: db::store
//! Responsibility: the key-value lookup collaborator consumed by the join
//! reader, plus the table/index descriptors and key layout it reads.
//! Does not own: transactions, replication, or persistence.
//! Boundary: operators only see `KvLookup`; `MemoryStore` is the in-process
//! implementation used by tests and embedders.

mod decode;
mod descriptor;
mod key;
mod memory;

#[cfg(test)]
mod tests;

pub use decode::RowDecoder;
pub use descriptor::{ColumnDescriptor, IndexDescriptor, TableDescriptor};
pub use memory::MemoryStore;

pub(crate) use key::{lookup_prefix, prefix_end, primary_key_from_secondary};

use crate::error::InternalError;
use serde::{Deserialize, Serialize};

///
/// KvEntry
///
/// One stored key/value pair.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KvEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

///
/// KeySpan
///
/// Half-open key range `[start, end)`; `end = None` is unbounded.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeySpan {
    pub start: Vec<u8>,
    pub end: Option<Vec<u8>>,
}

impl KeySpan {
    /// Span covering every key that starts with `prefix`.
    #[must_use]
    pub fn prefix(prefix: Vec<u8>) -> Self {
        let end = prefix_end(&prefix);
        Self { start: prefix, end }
    }

    /// Span covering exactly one key.
    #[must_use]
    pub fn point(key: Vec<u8>) -> Self {
        let mut end = key.clone();
        end.push(0);
        Self {
            start: key,
            end: Some(end),
        }
    }
}

///
/// RangeInfo
///
/// Range placement observed while serving a lookup: the range bounds and
/// the node holding its lease. Forwarded downstream as metadata so planners
/// can refresh stale range caches.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RangeInfo {
    pub start_key: Vec<u8>,
    pub end_key: Option<Vec<u8>>,
    pub lease_holder: u64,
}

///
/// LookupRequest
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LookupRequest {
    pub spans: Vec<KeySpan>,
}

///
/// LookupResponse
///
/// `results[i]` holds the entries of `spans[i]` in key order.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LookupResponse {
    pub results: Vec<Vec<KvEntry>>,
    pub ranges: Vec<RangeInfo>,
}

///
/// KvLookup
///
/// Batched span reads against a sorted key-value store.
/// Implementations provide their own read consistency.
///

pub trait KvLookup {
    fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse, InternalError>;
}

impl<T> KvLookup for &T
where
    T: KvLookup + ?Sized,
{
    fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse, InternalError> {
        (**self).lookup(request)
    }
}
