//! Defensive profile of a combatant: resists, mitigation, wards.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use super::packet::{DamageCategory, DamagePart, DamageType};
use crate::config::{CombatConfig, WardTieBreak};

/// Flat-then-percent reduction for one category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Mitigation {
    pub flat: u32,
    pub percent: u32,
}

/// Which parts a ward soaks. Empty filters match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WardFilter {
    pub kinds: Vec<DamageType>,
    pub category: Option<DamageCategory>,
}

impl WardFilter {
    pub fn matches(&self, part: &DamagePart) -> bool {
        let kind_ok = self.kinds.is_empty() || self.kinds.contains(&part.kind);
        let category_ok = self.category.map(|c| c == part.category).unwrap_or(true);
        kind_ok && category_ok
    }
}

/// Finite-capacity absorption buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ward {
    pub id: String,
    pub remaining: u32,
    pub priority: i32,
    pub filter: WardFilter,
}

pub type Wards = ArrayVec<Ward, { CombatConfig::MAX_WARDS }>;

/// Everything the pipeline reads from a target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Defenses {
    /// Per-type resist percent for elemental damage.
    pub resists: BTreeMap<DamageType, u32>,
    pub physical: Mitigation,
    pub spell: Mitigation,
    pub wards: Wards,
}

impl Defenses {
    pub fn resist(&self, kind: DamageType) -> u32 {
        self.resists.get(&kind).copied().unwrap_or(0)
    }

    pub fn mitigation(&self, category: DamageCategory) -> Mitigation {
        match category {
            DamageCategory::Physical => self.physical,
            DamageCategory::Spell => self.spell,
        }
    }

    /// Adds a ward, replacing one with the same id. Returns false when full.
    pub fn add_ward(&mut self, ward: Ward) -> bool {
        if let Some(existing) = self.wards.iter_mut().find(|w| w.id == ward.id) {
            *existing = ward;
            return true;
        }
        self.wards.try_push(ward).is_ok()
    }

    /// Drops depleted wards.
    pub fn prune_wards(&mut self) {
        self.wards.retain(|ward| ward.remaining > 0);
    }

    /// Ward indices in soak order: priority descending, then the tie-break.
    pub fn soak_order(&self, tie_break: WardTieBreak) -> ArrayVec<usize, { CombatConfig::MAX_WARDS }> {
        let mut order: ArrayVec<usize, { CombatConfig::MAX_WARDS }> =
            (0..self.wards.len()).collect();
        // Stable sort keeps insertion order among equal keys.
        order.sort_by(|&a, &b| {
            let (wa, wb) = (&self.wards[a], &self.wards[b]);
            wb.priority.cmp(&wa.priority).then_with(|| match tie_break {
                WardTieBreak::InsertionOrder => core::cmp::Ordering::Equal,
                WardTieBreak::LargestFirst => wb.remaining.cmp(&wa.remaining),
                WardTieBreak::SmallestFirst => wa.remaining.cmp(&wb.remaining),
            })
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ward(id: &str, remaining: u32, priority: i32) -> Ward {
        Ward {
            id: id.into(),
            remaining,
            priority,
            filter: WardFilter::default(),
        }
    }

    #[test]
    fn soak_order_respects_priority_and_tie_break() {
        let mut defenses = Defenses::default();
        defenses.add_ward(ward("a", 10, 1));
        defenses.add_ward(ward("b", 30, 5));
        defenses.add_ward(ward("c", 50, 1));

        let ids = |order: &[usize]| {
            order
                .iter()
                .map(|&i| defenses.wards[i].id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&defenses.soak_order(WardTieBreak::InsertionOrder)), ["b", "a", "c"]);
        assert_eq!(ids(&defenses.soak_order(WardTieBreak::LargestFirst)), ["b", "c", "a"]);
    }

    #[test]
    fn filter_matches_kind_and_category() {
        let filter = WardFilter {
            kinds: vec![DamageType::Fire],
            category: Some(DamageCategory::Spell),
        };
        let fire_spell = DamagePart {
            kind: DamageType::Fire,
            category: DamageCategory::Spell,
            amount: 1,
        };
        let fire_melee = DamagePart {
            category: DamageCategory::Physical,
            ..fire_spell
        };
        assert!(filter.matches(&fire_spell));
        assert!(!filter.matches(&fire_melee));
    }
}
