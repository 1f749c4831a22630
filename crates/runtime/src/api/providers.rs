//! Suspend point of two-phase steps.
//!
//! AI casts are validated, then the [`ConfirmationProvider`] is awaited, then
//! the cast is committed. A UI, a replay driver or a test fixture decides at
//! the suspend point.
use async_trait::async_trait;
use serde::Serialize;

use combat_core::CombatantId;

/// A validated step waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingStep {
    pub actor: CombatantId,
    pub ability: String,
    pub target: CombatantId,
}

/// Decision taken at the suspend point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confirmation {
    Proceed,
    /// Abandon the step. Nothing has been committed.
    Cancel,
}

#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    async fn confirm(&self, step: &PendingStep) -> Confirmation;
}

/// Confirms every step immediately.
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationProvider for AutoConfirm {
    async fn confirm(&self, _step: &PendingStep) -> Confirmation {
        Confirmation::Proceed
    }
}
