//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker is the single authoritative executor: it owns the
//! combat state and applies commands, turn triggers and requests in order.

mod simulation;

pub use simulation::{Command, SimulationWorker, TurnOutcome, World};
