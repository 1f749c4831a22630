//! Event types for the turn and notice topics.

use serde::Serialize;

use combat_core::{CombatantId, EncounterId, TurnReport};

use crate::ai::TurnDecision;
use crate::authority::ParticipantId;

/// Why a turn trigger was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The same `(encounter, round, turn)` was already processed.
    Duplicate,
    /// The trigger arrived within the minimum re-entrancy interval.
    TooSoon,
}

/// Events related to turn management
#[derive(Debug, Clone, Serialize)]
pub enum TurnEvent {
    Advanced {
        encounter: EncounterId,
        round: u32,
        turn: u32,
        /// Combatants the decision engine ran for.
        driven: Vec<CombatantId>,
        report: TurnReport,
    },
    Skipped {
        encounter: EncounterId,
        round: u32,
        turn: u32,
        reason: SkipReason,
    },
    Decided(TurnDecision),
}

impl TurnEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TurnEvent::Advanced { .. } => "turn-processed",
            TurnEvent::Skipped { .. } => "turn-skipped",
            TurnEvent::Decided(_) => "ai-decision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeOutcome {
    Applied,
    NotApplied,
}

/// Observational notice sent back for a request.
///
/// Rejections carry no detail: the requester learns only that nothing
/// happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub requester: ParticipantId,
    pub outcome: NoticeOutcome,
    pub detail: String,
}

impl Notice {
    pub fn applied(requester: ParticipantId, detail: impl Into<String>) -> Self {
        Self {
            requester,
            outcome: NoticeOutcome::Applied,
            detail: detail.into(),
        }
    }

    pub fn rejected(requester: ParticipantId) -> Self {
        Self {
            requester,
            outcome: NoticeOutcome::NotApplied,
            detail: "request not applied".to_owned(),
        }
    }
}
