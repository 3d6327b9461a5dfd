//! Logging setup and timing.

mod tracing;

pub use self::tracing::{init_tracing, LogFormat, SpanTimer};
