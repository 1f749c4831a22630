//! Extensibility checkpoints between pipeline phases.
//!
//! Hooks run in priority order (lower first) at every checkpoint. A hook may
//! only shrink part amounts. A hook that fails, or that grows any amount, is
//! reverted for that checkpoint and recorded as a [`PhaseFault`]; earlier
//! phases and earlier hooks keep their effect.

use std::sync::Arc;

use super::packet::DamagePacket;
use super::workflow::{Bucket, DamageWorkflow};
use crate::error::{ErrorSeverity, RuleError};

/// Pipeline boundary at which hooks run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Checkpoint {
    BeforeResist,
    AfterResist,
    AfterMitigate,
    AfterAbsorb,
}

impl Checkpoint {
    /// Bucket credited with reductions made at this checkpoint.
    pub const fn bucket(self) -> Bucket {
        match self {
            Checkpoint::BeforeResist | Checkpoint::AfterResist => Bucket::Resisted,
            Checkpoint::AfterMitigate => Bucket::Mitigated,
            Checkpoint::AfterAbsorb => Bucket::Absorbed,
        }
    }
}

/// How loudly a hook failure is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HookCriticality {
    /// Logged at error level.
    Critical,
    /// Logged at error level (default).
    #[default]
    Important,
    /// Logged at debug level.
    Optional,
}

/// Failure raised by a damage hook.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error("hook failed: {0}")]
    Failed(String),
}

impl RuleError for HookError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        "hook-failed"
    }
}

/// What a hook sees at a checkpoint.
pub struct CheckpointContext<'a> {
    pub checkpoint: Checkpoint,
    pub packet: &'a DamagePacket,
    /// Current amount per part, aligned with `packet.parts()`.
    pub amounts: &'a mut [u32],
}

/// Extension point invoked at pipeline checkpoints.
pub trait DamageHook: Send + Sync {
    /// Returns the name of this hook for debugging and faults.
    fn name(&self) -> &'static str;

    /// Lower values execute first.
    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    fn on_checkpoint(&self, ctx: &mut CheckpointContext<'_>) -> Result<(), HookError>;
}

/// Why a hook invocation was reverted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultKind {
    Failed(String),
    /// The hook tried to increase an amount.
    Grew,
}

/// A reverted hook invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PhaseFault {
    pub hook: &'static str,
    pub checkpoint: Checkpoint,
    pub criticality: HookCriticality,
    pub kind: FaultKind,
}

/// Priority-ordered damage hooks.
#[derive(Clone, Default)]
pub struct DamageHooks {
    hooks: Arc<[Arc<dyn DamageHook>]>,
}

impl DamageHooks {
    pub fn new(mut hooks: Vec<Arc<dyn DamageHook>>) -> Self {
        hooks.sort_by_key(|hook| hook.priority());
        Self {
            hooks: hooks.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names and priorities (for debugging).
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.hooks.iter().map(|h| (h.name(), h.priority()))
    }

    /// Runs every hook at `checkpoint` against the workflow.
    pub fn run(&self, checkpoint: Checkpoint, workflow: &mut DamageWorkflow) {
        for hook in self.hooks.iter() {
            let before: Vec<u32> = workflow.remaining().to_vec();

            let result = {
                let (packet, amounts) = workflow.split_mut();
                let mut ctx = CheckpointContext {
                    checkpoint,
                    packet,
                    amounts,
                };
                hook.on_checkpoint(&mut ctx)
            };

            let grew = workflow
                .remaining()
                .iter()
                .zip(&before)
                .any(|(after, before)| after > before);

            let fault = match result {
                Err(HookError::Failed(message)) => Some(FaultKind::Failed(message)),
                Ok(()) if grew => Some(FaultKind::Grew),
                Ok(()) => None,
            };

            if let Some(kind) = fault {
                workflow.remaining_mut().copy_from_slice(&before);
                workflow.faults.push(PhaseFault {
                    hook: hook.name(),
                    checkpoint,
                    criticality: hook.criticality(),
                    kind,
                });
                continue;
            }

            let reduced: u32 = before
                .iter()
                .zip(workflow.remaining())
                .map(|(before, after)| before - after)
                .sum();
            workflow.credit(checkpoint.bucket(), reduced);
        }
    }
}

impl core::fmt::Debug for DamageHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}
