//! Damage pipeline hooks as seen from the runtime.
//!
//! Hooks themselves live in `combat-core` and run inside the pipeline. A hook
//! that fails, or tries to grow an amount, is reverted for its checkpoint and
//! surfaces here as a [`PhaseFault`]. Reporting follows the hook's
//! criticality:
//! - [`HookCriticality::Critical`] and [`HookCriticality::Important`] log at
//!   `error`
//! - [`HookCriticality::Optional`] logs at `debug`
//!
//! Faults never abort the packet: damage resolved by earlier phases stands.

pub use combat_core::{
    Checkpoint, CheckpointContext, DamageHook, DamageHooks, FaultKind, HookCriticality, HookError,
    PhaseFault,
};

use combat_core::PacketId;
use tracing::{debug, error};

/// Logs one reverted hook invocation.
pub fn report_fault(packet: PacketId, fault: &PhaseFault) {
    let checkpoint: &'static str = fault.checkpoint.into();
    match fault.criticality {
        HookCriticality::Critical => error!(
            target: "runtime::hooks",
            ?packet,
            hook = fault.hook,
            checkpoint,
            kind = ?fault.kind,
            "critical damage hook reverted"
        ),
        HookCriticality::Important => error!(
            target: "runtime::hooks",
            ?packet,
            hook = fault.hook,
            checkpoint,
            kind = ?fault.kind,
            "damage hook reverted - continuing pipeline"
        ),
        HookCriticality::Optional => debug!(
            target: "runtime::hooks",
            ?packet,
            hook = fault.hook,
            checkpoint,
            "optional damage hook reverted"
        ),
    }
}
