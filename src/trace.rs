//! Tracing hooks for the gamma statistics pipeline
//!
//! Each stage enters a debug span for its duration and reports what it
//! touched through debug events. With the `tracing` feature the macros expand
//! to `tracing` calls; without it spans become a unit guard and events vanish.
//!
//! ```rust,ignore
//! let _guard = trace_enter!("collect_ln_gammas", tensors = names.len());
//! trace_event!(key = %key, len = values.len(), "gamma collected");
//! ```

/// Guard held for the lifetime of a stage when tracing is compiled out
#[cfg(not(feature = "tracing"))]
pub struct StageGuard;

/// Enter a debug span named after the stage, optionally with fields
#[macro_export]
#[cfg(feature = "tracing")]
macro_rules! trace_enter {
    ($stage:expr) => {
        tracing::debug_span!($stage).entered()
    };
    ($stage:expr, $($field:tt)+) => {
        tracing::debug_span!($stage, $($field)+).entered()
    };
}

/// Enter a stage (tracing compiled out)
#[macro_export]
#[cfg(not(feature = "tracing"))]
macro_rules! trace_enter {
    ($stage:expr $(, $($field:tt)+)?) => {
        $crate::trace::StageGuard
    };
}

/// Emit a debug event inside the current stage
#[macro_export]
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($($arg:tt)+) => {
        tracing::debug!($($arg)+)
    };
}

/// Emit a debug event (tracing compiled out)
#[macro_export]
#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($($arg:tt)+) => {};
}
