use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for operator runs on this thread.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub operators: BTreeMap<String, OperatorCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            operators: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Operator entrypoints
    pub runs: u64,

    // Rows through post-processing
    pub rows_read: u64,
    pub rows_emitted: u64,
    pub rows_filtered: u64,

    // Lookup collaborator traffic
    pub lookup_batches: u64,
    pub lookup_keys: u64,
    pub lookup_entries: u64,

    // Draining
    pub drains: u64,
    pub rows_discarded: u64,

    // Grouping
    pub groups_emitted: u64,
    pub group_rows: u64,
    pub ordering_violations: u64,
}

///
/// OperatorCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OperatorCounters {
    pub runs: u64,
    pub rows_read: u64,
    pub rows_emitted: u64,
    pub rows_filtered: u64,
    pub drains: u64,
    pub elapsed_micros_total: u128,
    pub elapsed_micros_max: u64,
}

///
/// EventReport
///
/// Point-in-time snapshot handed to callers.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Snapshot the current counters.
pub(crate) fn report() -> EventReport {
    EventReport {
        counters: with_state(Clone::clone),
    }
}

/// Accumulate elapsed time and track a max.
pub(crate) fn add_elapsed(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
