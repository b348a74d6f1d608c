//! Metrics sink boundary.
//!
//! Operator logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// OperatorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatorKind {
    JoinReader,
    SortedDistinct,
}

impl OperatorKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::JoinReader => "join_reader",
            Self::SortedDistinct => "sorted_distinct",
        }
    }
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        operator: OperatorKind,
    },
    ExecFinish {
        operator: OperatorKind,
        elapsed_micros: u64,
    },
    RowsRead {
        operator: OperatorKind,
        rows: u64,
    },
    RowsEmitted {
        operator: OperatorKind,
        rows: u64,
    },
    RowsFiltered {
        operator: OperatorKind,
        rows: u64,
    },
    LookupBatch {
        keys: u64,
        entries: u64,
    },
    Drained {
        operator: OperatorKind,
        rows_discarded: u64,
    },
    GroupEmitted {
        rows: u64,
    },
    OrderingViolation,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { operator } => {
                metrics::with_state_mut(|m| {
                    m.ops.runs = m.ops.runs.saturating_add(1);
                    let entry = m.operators.entry(operator.label().to_string()).or_default();
                    entry.runs = entry.runs.saturating_add(1);
                });
            }

            MetricsEvent::ExecFinish {
                operator,
                elapsed_micros,
            } => {
                metrics::with_state_mut(|m| {
                    let entry = m.operators.entry(operator.label().to_string()).or_default();
                    metrics::add_elapsed(
                        &mut entry.elapsed_micros_total,
                        &mut entry.elapsed_micros_max,
                        elapsed_micros,
                    );
                });
            }

            MetricsEvent::RowsRead { operator, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_read = m.ops.rows_read.saturating_add(rows);
                    let entry = m.operators.entry(operator.label().to_string()).or_default();
                    entry.rows_read = entry.rows_read.saturating_add(rows);
                });
            }

            MetricsEvent::RowsEmitted { operator, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_emitted = m.ops.rows_emitted.saturating_add(rows);
                    let entry = m.operators.entry(operator.label().to_string()).or_default();
                    entry.rows_emitted = entry.rows_emitted.saturating_add(rows);
                });
            }

            MetricsEvent::RowsFiltered { operator, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_filtered = m.ops.rows_filtered.saturating_add(rows);
                    let entry = m.operators.entry(operator.label().to_string()).or_default();
                    entry.rows_filtered = entry.rows_filtered.saturating_add(rows);
                });
            }

            MetricsEvent::LookupBatch { keys, entries } => {
                metrics::with_state_mut(|m| {
                    m.ops.lookup_batches = m.ops.lookup_batches.saturating_add(1);
                    m.ops.lookup_keys = m.ops.lookup_keys.saturating_add(keys);
                    m.ops.lookup_entries = m.ops.lookup_entries.saturating_add(entries);
                });
            }

            MetricsEvent::Drained {
                operator,
                rows_discarded,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.drains = m.ops.drains.saturating_add(1);
                    m.ops.rows_discarded = m.ops.rows_discarded.saturating_add(rows_discarded);
                    let entry = m.operators.entry(operator.label().to_string()).or_default();
                    entry.drains = entry.drains.saturating_add(1);
                });
            }

            MetricsEvent::GroupEmitted { rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.groups_emitted = m.ops.groups_emitted.saturating_add(1);
                    m.ops.group_rows = m.ops.group_rows.saturating_add(rows);
                });
            }

            MetricsEvent::OrderingViolation => {
                metrics::with_state_mut(|m| {
                    m.ops.ordering_violations = m.ops.ordering_violations.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` always restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - Only a shared reference is materialized, matching the shared borrow
        //   used to install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}

/// Span
/// RAII guard that emits start/finish metrics events for one operator run.
/// Ensures finish accounting happens even on unwind.

pub(crate) struct Span {
    operator: OperatorKind,
    start: Instant,
}

impl Span {
    #[must_use]
    pub(crate) fn new(operator: OperatorKind) -> Self {
        record(MetricsEvent::ExecStart { operator });

        Self {
            operator,
            start: Instant::now(),
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let elapsed_micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            operator: self.operator,
            elapsed_micros,
        });
    }
}

///
/// TESTS
///
