//! Authoritative combat runtime.
//!
//! This crate wires the deterministic `combat-core` rules into a single
//! authoritative executor. Consumers embed [`Runtime`] to trigger turns,
//! submit requests, subscribe to events and query snapshots through
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`ai`] decides pet and hostile turns
//! - [`authority`] checks and applies participant requests
//! - [`events`] provides the topic-based event bus and rolling event log
//! - [`hooks`] reports damage pipeline hook faults
//! - `workers` keeps the simulation task internal to the crate
pub mod ai;
pub mod api;
pub mod authority;
pub mod events;
pub mod hooks;
pub mod runtime;

mod workers;

pub use ai::{TurnContext, TurnDecision};
pub use api::{
    AutoConfirm, Confirmation, ConfirmationProvider, PendingStep, Result, RuntimeError,
    RuntimeHandle,
};
pub use authority::{
    AuthorityExecutor, OwnershipCheck, OwnershipTable, ParticipantId, Request, RequestEnvelope,
};
pub use events::{
    Event, EventBus, EventLog, LogEntry, Notice, NoticeOutcome, SkipReason, Topic, TurnEvent,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::TurnOutcome;
