//! Charm records.
//!
//! Charming flips a hostile combatant to the charmer's side. The record keeps
//! a snapshot of everything the flip overwrites so a release restores it.

use crate::state::{AiConfig, Allegiance, CombatClock, CombatantId, RoundStamp};

/// Pre-charm state restored on release.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllegianceSnapshot {
    pub allegiance: Allegiance,
    pub owner: Option<CombatantId>,
    pub ai: AiConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharmRecord {
    pub charmer: CombatantId,
    pub kind: String,
    pub applied_round: u32,
    pub expiry: Option<RoundStamp>,
    pub snapshot: AllegianceSnapshot,
}

impl CharmRecord {
    pub fn is_expired(&self, clock: &CombatClock) -> bool {
        self.expiry
            .map(|expiry| expiry.is_reached(clock) || expiry.is_stale(clock))
            .unwrap_or(false)
    }
}

/// Why a charm ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ReleaseReason {
    Expired,
    /// Damage broke the charm.
    Broken,
    Dismissed,
    /// The charmer charmed someone else.
    Replaced,
    Died,
}

/// Charm duration in rounds, extended by charmer mastery.
pub fn charm_rounds(rounds: u32, mastery: u32, mastery_rounds: u32) -> u32 {
    rounds.saturating_add(mastery.saturating_mul(mastery_rounds))
}
