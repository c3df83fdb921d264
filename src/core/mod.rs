//! Core state types shared between the supervisor, workflows and shell
//!
//! Everything in here is plain data plus the locking it needs; no I/O.

pub mod amounts;
pub mod logs;
pub mod telemetry;

pub use amounts::{xfg_to_atomic, ATOMIC_UNITS_PER_XFG};
pub use logs::{LogAggregator, LogEntry, LOG_CAPACITY};
pub use telemetry::TelemetrySnapshot;
