//! Observability
//!
//! Logging, Prometheus metrics and the JSONL session event stream.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, RunSummary, StopReason};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
