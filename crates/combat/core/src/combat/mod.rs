//! Damage resolution.
//!
//! Pure functions and plain data: packets, the phase pipeline with its
//! extensibility checkpoints, ward/defense profiles, hit and break chances.
//! Committing results to combatants happens in [`crate::engine`].

pub mod breaks;
pub mod checkpoint;
pub mod hit;
pub mod packet;
pub mod pipeline;
pub mod ward;
pub mod workflow;

pub use breaks::{break_key, charm_break_chance, mez_break_chance};
pub use checkpoint::{
    Checkpoint, CheckpointContext, DamageHook, DamageHooks, FaultKind, HookCriticality, HookError,
    PhaseFault,
};
pub use hit::calculate_hit_chance;
pub use packet::{DamageCategory, DamagePacket, DamagePart, DamageRequest, DamageType};
pub use pipeline::resolve;
pub use ward::{Defenses, Mitigation, Ward, WardFilter};
pub use workflow::{Bucket, DamageWorkflow};
