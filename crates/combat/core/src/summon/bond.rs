//! Bond: stat bonuses a summon derives from its owner.

use crate::state::{CombatBonuses, ResourcePool};

/// `base + floor(level * per_level_percent / 100)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LevelScaling {
    pub base: i32,
    /// Per owner level, in hundredths (200 = ×2).
    pub per_level_percent: u32,
}

impl LevelScaling {
    pub const fn new(base: i32, per_level_percent: u32) -> Self {
        Self {
            base,
            per_level_percent,
        }
    }

    pub fn at_level(&self, level: u32) -> i32 {
        let scaled = (u64::from(level) * u64::from(self.per_level_percent)) / 100;
        self.base.saturating_add(i32::try_from(scaled).unwrap_or(i32::MAX))
    }
}

/// Level-scaled bond formulas per stat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BondTemplate {
    pub hp: LevelScaling,
    pub attack: LevelScaling,
    pub damage: LevelScaling,
    pub armor: LevelScaling,
}

/// Flat catalog bonuses added on top of the scaled template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BondBonus {
    pub hp: i32,
    pub attack: i32,
    pub damage: i32,
    pub armor: i32,
}

/// Derived bond.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bond {
    pub hp: i32,
    pub attack: i32,
    pub damage: i32,
    pub armor: i32,
}

impl Bond {
    pub fn compute(template: &BondTemplate, flat: &BondBonus, owner_level: u32) -> Self {
        Self {
            hp: template.hp.at_level(owner_level) + flat.hp,
            attack: template.attack.at_level(owner_level) + flat.attack,
            damage: template.damage.at_level(owner_level) + flat.damage,
            armor: template.armor.at_level(owner_level) + flat.armor,
        }
    }

    pub fn as_bonuses(&self) -> CombatBonuses {
        CombatBonuses {
            attack: self.attack,
            damage: self.damage,
            armor: self.armor,
            max_hp: self.hp,
        }
    }

    /// Projects the HP bonus onto `hp`, whose unbonded maximum is `base_max`.
    pub fn project_hp(&self, hp: &mut ResourcePool, base_max: u32) {
        let new_max = (i64::from(base_max) + i64::from(self.hp)).max(1);
        hp.rescale_max(u32::try_from(new_max).unwrap_or(u32::MAX));
    }
}
