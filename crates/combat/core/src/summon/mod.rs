//! Summon lifecycle records.
//!
//! A summon is an ordinary combatant carrying a [`SummonRecord`] bound to its
//! owner. At most one active record exists per `(owner, kind)`; spawning a new
//! one despawns the prior one first. Despawned summons keep their identity in
//! the roster, inactive and unplaced.

pub mod bond;
pub mod placement;

pub use bond::{Bond, BondBonus, BondTemplate, LevelScaling};
pub use placement::{find_free_cell, ring};

use crate::state::{CombatClock, CombatantId, RoundStamp};

/// Summon kind used for charmed combatants.
pub const CHARM_KIND: &str = "charm";

/// Why a summon left the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DespawnReason {
    Expired,
    Dismissed,
    /// A newer summon of the same kind took its place.
    Replaced,
    Died,
    /// The owner left the field.
    OwnerGone,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonRecord {
    pub owner: CombatantId,
    pub kind: String,
    pub active: bool,
    pub expiry: Option<RoundStamp>,
    /// Catalog entry the summon was instantiated from.
    pub source: String,
    pub variant: Option<String>,
    pub bond: Bond,
    /// Unbonded maximum HP, for re-projection.
    pub base_max_hp: u32,
}

impl SummonRecord {
    /// Reached in the active encounter, or stamped in another one.
    pub fn is_expired(&self, clock: &CombatClock) -> bool {
        self.expiry
            .map(|expiry| expiry.is_reached(clock) || expiry.is_stale(clock))
            .unwrap_or(false)
    }

    pub fn is_charm(&self) -> bool {
        self.kind == CHARM_KIND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EncounterId;

    #[test]
    fn stale_expiry_counts_as_expired() {
        let record = SummonRecord {
            owner: CombatantId(1),
            kind: "wolf".into(),
            active: true,
            expiry: Some(RoundStamp::new(EncounterId(1), 5)),
            source: "wolf".into(),
            variant: None,
            bond: Bond::default(),
            base_max_hp: 50,
        };
        assert!(!record.is_expired(&CombatClock::in_encounter(EncounterId(1), 4, 0)));
        assert!(record.is_expired(&CombatClock::in_encounter(EncounterId(1), 5, 0)));
        assert!(record.is_expired(&CombatClock::in_encounter(EncounterId(2), 1, 0)));
        assert!(record.is_expired(&CombatClock::idle(0)));
    }
}
