//! Declarative catalog records and the oracle that serves them.
//!
//! Abilities, summons and maintained effects are externally supplied data.
//! Every effect is a closed [`EffectSpec`] variant, so an unknown effect kind
//! is a load-time error rather than a runtime lookup miss.

use std::collections::BTreeMap;

use crate::combat::{DamageCategory, DamageType, WardFilter};
use crate::condition::{ConditionKind, ConditionMeta};
use crate::cooldown::CooldownSpec;
use crate::state::{AiConfig, CombatStats, Role};
use crate::summon::{BondBonus, BondTemplate};

/// `base + floor(level * per_level_percent / 100) + per_rank * (rank - 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Amount {
    pub base: u32,
    pub per_level_percent: u32,
    pub per_rank: u32,
}

impl Amount {
    pub const fn flat(base: u32) -> Self {
        Self {
            base,
            per_level_percent: 0,
            per_rank: 0,
        }
    }

    pub fn resolve(&self, level: u32, rank: u32) -> u32 {
        let level_part = (u64::from(level) * u64::from(self.per_level_percent)) / 100;
        let rank_part = u64::from(self.per_rank) * u64::from(rank.saturating_sub(1));
        let total = u64::from(self.base) + level_part + rank_part;
        u32::try_from(total).unwrap_or(u32::MAX)
    }
}

/// One declared effect of an ability or maintained effect.
#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectSpec {
    Damage {
        kind: DamageType,
        category: DamageCategory,
        amount: Amount,
    },
    Heal {
        amount: Amount,
    },
    RestoreMana {
        amount: Amount,
    },
    ApplyCondition {
        kind: ConditionKind,
        #[cfg_attr(feature = "serde", serde(default))]
        rounds: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default))]
        meta: ConditionMeta,
    },
    RemoveCondition {
        kind: ConditionKind,
    },
    Taunt {
        rounds: u32,
    },
    Ward {
        id: String,
        capacity: Amount,
        #[cfg_attr(feature = "serde", serde(default))]
        priority: i32,
        #[cfg_attr(feature = "serde", serde(default))]
        filter: WardFilter,
    },
    Summon {
        kind: String,
        #[cfg_attr(feature = "serde", serde(default))]
        variant: Option<String>,
    },
    Charm {
        rounds: u32,
    },
}

/// Who an ability may target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetKind {
    /// Always the caster; any requested target is ignored.
    #[default]
    Caster,
    Ally,
    Enemy,
}

/// Rotation classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityTag {
    Heal,
    /// Damage over time.
    Dot,
    Debuff,
    DirectDamage,
    Taunt,
    Buff,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbilitySpec {
    pub id: String,
    pub name: String,
    pub target: TargetKind,
    /// Chebyshev cells.
    pub range: u32,
    pub mana_cost: u32,
    pub cooldown: Option<CooldownSpec>,
    /// Shared cooldown group.
    pub group: Option<String>,
    pub tags: Vec<AbilityTag>,
    /// Higher is tried first within a rotation tier.
    pub priority: i32,
    pub max_rank: u32,
    pub effects: Vec<EffectSpec>,
}

impl AbilitySpec {
    pub fn has_tag(&self, tag: AbilityTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Maintained-effect definition, keyed by the ability that starts it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SongSpec {
    pub group: String,
    pub duration_rounds: u32,
    pub pulse_interval: u32,
    pub priority: i32,
    /// Re-resolved on every pulse.
    pub effects: Vec<EffectSpec>,
}

/// Unbonded stats of a summon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummonBase {
    pub max_hp: u32,
    pub max_mana: u32,
    pub stats: CombatStats,
    pub role: Role,
}

/// An alternate form a live summon can be swapped into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummonVariant {
    pub name: String,
    pub base: SummonBase,
    pub bundle: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummonSpec {
    pub kind: String,
    pub name: String,
    pub base: SummonBase,
    pub bond: BondTemplate,
    pub flat: BondBonus,
    pub default_rounds: Option<u32>,
    pub ai: AiConfig,
    /// Abilities-bundle reference.
    pub bundle: Option<String>,
    pub variants: BTreeMap<String, SummonVariant>,
}

impl SummonSpec {
    /// Base stats and bundle for `variant`, or the default form.
    pub fn form(&self, variant: Option<&str>) -> Option<(&str, SummonBase, Option<&str>)> {
        match variant {
            None => Some((self.name.as_str(), self.base, self.bundle.as_deref())),
            Some(id) => self
                .variants
                .get(id)
                .map(|v| (v.name.as_str(), v.base, v.bundle.as_deref())),
        }
    }
}

/// Read-only access to catalog records.
pub trait CatalogOracle: Send + Sync {
    fn ability(&self, id: &str) -> Option<&AbilitySpec>;

    fn summon(&self, kind: &str) -> Option<&SummonSpec>;

    /// Maintained-effect definition started by ability `id`, if any.
    fn song(&self, id: &str) -> Option<&SongSpec>;

    /// Ability ids of an abilities bundle.
    fn bundle(&self, id: &str) -> Option<&[String]>;
}

/// In-memory catalog, used directly in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    pub abilities: BTreeMap<String, AbilitySpec>,
    pub summons: BTreeMap<String, SummonSpec>,
    pub songs: BTreeMap<String, SongSpec>,
    pub bundles: BTreeMap<String, Vec<String>>,
}

impl MemoryCatalog {
    pub fn with_ability(mut self, spec: AbilitySpec) -> Self {
        self.abilities.insert(spec.id.clone(), spec);
        self
    }

    pub fn with_summon(mut self, spec: SummonSpec) -> Self {
        self.summons.insert(spec.kind.clone(), spec);
        self
    }

    pub fn with_song(mut self, ability: impl Into<String>, spec: SongSpec) -> Self {
        self.songs.insert(ability.into(), spec);
        self
    }

    pub fn with_bundle(mut self, id: impl Into<String>, abilities: Vec<String>) -> Self {
        self.bundles.insert(id.into(), abilities);
        self
    }
}

impl CatalogOracle for MemoryCatalog {
    fn ability(&self, id: &str) -> Option<&AbilitySpec> {
        self.abilities.get(id)
    }

    fn summon(&self, kind: &str) -> Option<&SummonSpec> {
        self.summons.get(kind)
    }

    fn song(&self, id: &str) -> Option<&SongSpec> {
        self.songs.get(id)
    }

    fn bundle(&self, id: &str) -> Option<&[String]> {
        self.bundles.get(id).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_scales_with_level_and_rank() {
        let amount = Amount {
            base: 10,
            per_level_percent: 150,
            per_rank: 4,
        };
        assert_eq!(amount.resolve(1, 1), 11);
        assert_eq!(amount.resolve(10, 3), 10 + 15 + 8);
    }
}
