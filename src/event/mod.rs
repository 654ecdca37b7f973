//! Event sourcing - audit trail of deployment runs
//!
//! - [`EventLog`]: thread-safe, append-only in-memory log
//! - [`TraceWriter`]: NDJSON persistence for `platy trace`

mod log;
mod trace;

pub use log::{Event, EventKind, EventLog};
pub use trace::{
    calculate_stack_hash, generate_generation_id, list_traces, TraceInfo, TraceWriter,
};
