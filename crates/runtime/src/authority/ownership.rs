//! Ownership relation between participants and combatants.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use combat_core::{CombatState, CombatantId};

/// A non-authoritative party issuing requests (a player seat, a tool).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant-{}", self.0)
    }
}

/// Injectable predicate: does `participant` directly own `combatant`?
pub trait OwnershipCheck: Send + Sync {
    fn owns(&self, participant: ParticipantId, combatant: CombatantId) -> bool;
}

impl<F> OwnershipCheck for F
where
    F: Fn(ParticipantId, CombatantId) -> bool + Send + Sync,
{
    fn owns(&self, participant: ParticipantId, combatant: CombatantId) -> bool {
        self(participant, combatant)
    }
}

/// Static grant table.
#[derive(Clone, Debug, Default)]
pub struct OwnershipTable {
    grants: BTreeMap<ParticipantId, BTreeSet<CombatantId>>,
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, participant: ParticipantId, combatant: CombatantId) -> Self {
        self.grants.entry(participant).or_default().insert(combatant);
        self
    }
}

impl OwnershipCheck for OwnershipTable {
    fn owns(&self, participant: ParticipantId, combatant: CombatantId) -> bool {
        self.grants
            .get(&participant)
            .map(|owned| owned.contains(&combatant))
            .unwrap_or(false)
    }
}

/// Longest declared-owner chain followed before giving up.
const MAX_OWNER_CHAIN: usize = 8;

/// True when `participant` owns `combatant` directly or through the
/// combatant's declared owner chain.
pub fn may_control(
    check: &dyn OwnershipCheck,
    state: &CombatState,
    participant: ParticipantId,
    combatant: CombatantId,
) -> bool {
    let mut current = Some(combatant);
    for _ in 0..MAX_OWNER_CHAIN {
        let Some(id) = current else {
            return false;
        };
        if check.owns(participant, id) {
            return true;
        }
        current = state.roster.get(id).and_then(|c| c.owner);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{Allegiance, Combatant};

    #[test]
    fn ownership_follows_declared_owner() {
        let mut state = CombatState::new();
        let hero = state.spawn(Combatant::new("hero", Allegiance::Player, 100, 0));
        let wolf = state.spawn(Combatant::new("wolf", Allegiance::Ally, 50, 0).with_owner(hero));
        let stranger = state.spawn(Combatant::new("stranger", Allegiance::Player, 100, 0));

        let table = OwnershipTable::new().grant(ParticipantId(1), hero);
        assert!(may_control(&table, &state, ParticipantId(1), hero));
        assert!(may_control(&table, &state, ParticipantId(1), wolf));
        assert!(!may_control(&table, &state, ParticipantId(1), stranger));
        assert!(!may_control(&table, &state, ParticipantId(2), wolf));
    }

    #[test]
    fn closures_are_ownership_checks() {
        let state = CombatState::new();
        let everyone = |_: ParticipantId, _: CombatantId| true;
        assert!(may_control(&everyone, &state, ParticipantId(9), CombatantId(4)));
    }
}
