//! Request/authorization protocol.
//!
//! Non-authoritative parties send typed [`Request`]s; the simulation worker
//! checks ownership through an injectable [`OwnershipCheck`] and applies
//! accepted requests through the combat engine.

mod executor;
mod ownership;
mod request;

pub use executor::AuthorityExecutor;
pub use ownership::{OwnershipCheck, OwnershipTable, ParticipantId, may_control};
pub use request::{ChangeError, Request, RequestEnvelope, parse_changes, resolve_pet};
