//! Logging facilities for the multiselect palette.
//!
//! The palette uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the host application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("multiselect=debug,multiselect_core=debug")
//!     .init();
//! ```
//!
//! User-interaction failures are never surfaced to the host; they are
//! logged under the targets below at `debug` or `trace` level instead.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Task queue target.
    pub const TASK: &str = "multiselect_core::task";
    /// Background worker target.
    pub const WORKER: &str = "multiselect_core::worker";
    /// Signal/slot target.
    pub const SIGNAL: &str = "multiselect_core::signal";
    /// List reconciliation (moves, reordering, highlights).
    pub const RECONCILE: &str = "multiselect::reconcile";
    /// Filtering and the worker protocol.
    pub const FILTER: &str = "multiselect::filter";
    /// Synchronization with the host's native control.
    pub const HOST: &str = "multiselect::host";
    /// Performance spans.
    pub const PERF: &str = "multiselect::perf";
}

/// Span names used for tracing.
pub mod span_names {
    /// A single filter execution.
    pub const FILTER_RUN: &str = "filter_run";
    /// A batch move between the two lists.
    pub const BATCH_MOVE: &str = "batch_move";
}

/// A guard that keeps a performance span entered while it is alive.
///
/// # Example
///
/// ```
/// use multiselect_core::logging::{PerfSpan, span_names};
///
/// {
///     let _span = PerfSpan::new(span_names::FILTER_RUN);
///     // ... timed work ...
/// }
/// ```
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_nest_under_crate_names() {
        for target in [targets::TASK, targets::WORKER, targets::SIGNAL] {
            assert!(target.starts_with("multiselect_core::"), "{target}");
        }
        for target in [targets::RECONCILE, targets::FILTER, targets::HOST, targets::PERF] {
            assert!(target.starts_with("multiselect::"), "{target}");
        }
    }

    #[test]
    fn test_perf_span_with_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("multiselect=trace")
            .with_test_writer()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let _span = PerfSpan::new(span_names::BATCH_MOVE);
            tracing::debug!(target: targets::RECONCILE, "inside span");
        });
    }
}
