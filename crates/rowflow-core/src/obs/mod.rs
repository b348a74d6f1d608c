//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Operators never touch metrics state directly; every counter update
//! flows through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, OperatorCounters};
pub use sink::{
    MetricsEvent, MetricsSink, OperatorKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
