use std::collections::BTreeMap;

use super::{Combatant, CombatantId, Position};

/// Every combatant tracked by a combat state, keyed by id.
///
/// Ids are allocated sequentially and never reused.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    combatants: BTreeMap<CombatantId, Combatant>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `combatant` under a freshly allocated id.
    pub fn insert(&mut self, mut combatant: Combatant) -> CombatantId {
        let id = CombatantId(self.next_id);
        self.next_id += 1;
        combatant.id = id;
        self.combatants.insert(id, combatant);
        id
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.values_mut()
    }

    pub fn ids(&self) -> Vec<CombatantId> {
        self.combatants.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Active combatant standing on `cell`, other than `except`.
    pub fn occupant(&self, cell: Position, except: Option<CombatantId>) -> Option<CombatantId> {
        self.combatants
            .values()
            .find(|c| c.active && c.position == Some(cell) && Some(c.id) != except)
            .map(|c| c.id)
    }

    pub fn is_occupied(&self, cell: Position, except: Option<CombatantId>) -> bool {
        self.occupant(cell, except).is_some()
    }

    /// Active summon record of `owner` with `kind`.
    pub fn active_summon(&self, owner: CombatantId, kind: &str) -> Option<CombatantId> {
        self.combatants
            .values()
            .find(|c| {
                c.summon
                    .as_ref()
                    .map(|r| r.active && r.owner == owner && r.kind == kind)
                    .unwrap_or(false)
            })
            .map(|c| c.id)
    }
}
