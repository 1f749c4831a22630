//! Topic-based event bus and rolling log for runtime events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Every published event is also kept in a bounded
//! log that the query interface exposes.

mod bus;
mod log;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use log::{EventLog, LogEntry};
pub use types::{Notice, NoticeOutcome, SkipReason, TurnEvent};
