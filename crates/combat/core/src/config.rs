//! Combat rules configuration.
//!
//! Every tunable of the rules lives here. All sections deserialize with
//! defaults, so a partial TOML file is a valid configuration.

use std::collections::BTreeMap;

use crate::condition::{ConditionKind, ConditionMask};

/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub haste: HasteConfig,
    pub breaks: BreakConfig,
    pub songs: SongConfig,
    pub threat: ThreatConfig,
    pub wards: WardConfig,
    pub mitigation: MitigationConfig,
    pub summons: SummonConfig,
    pub ai: AiTuning,
    pub hit: HitConfig,
    /// Passive effect key → conditions it implies while enabled.
    pub effect_conditions: BTreeMap<String, Vec<ConditionKind>>,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum typed parts carried by one damage packet.
    pub const MAX_DAMAGE_PARTS: usize = 8;
    /// Maximum ward buffers on one combatant.
    pub const MAX_WARDS: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Conditions implied by a passive effect key.
    pub fn implied_by(&self, effect_key: &str) -> ConditionMask {
        self.effect_conditions
            .get(effect_key)
            .map(|kinds| ConditionMask::from_kinds(kinds.iter().copied()))
            .unwrap_or_else(ConditionMask::empty)
    }
}

/// Haste → bonus actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HasteConfig {
    pub max_bonus_actions: u32,
}

impl Default for HasteConfig {
    fn default() -> Self {
        Self {
            max_bonus_actions: 4,
        }
    }
}

/// Break chances for crowd control on damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BreakConfig {
    /// Mesmerize break chance when the condition carries no override.
    pub mez_default_percent: u32,
    pub charm_base_percent: u32,
    /// Added per `charm_step_damage` points of applied damage.
    pub charm_step_percent: u32,
    pub charm_step_damage: u32,
    pub charm_min_percent: u32,
    pub charm_max_percent: u32,
    /// Subtracted per point of charmer mastery.
    pub charm_mastery_reduction_percent: u32,
    /// Extra charm rounds per point of charmer mastery.
    pub charm_mastery_rounds: u32,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            mez_default_percent: 35,
            charm_base_percent: 20,
            charm_step_percent: 10,
            charm_step_damage: 50,
            charm_min_percent: 5,
            charm_max_percent: 50,
            charm_mastery_reduction_percent: 1,
            charm_mastery_rounds: 1,
        }
    }
}

/// Maintained-effect scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SongConfig {
    pub max_active: usize,
    pub cadence_rounds: u32,
    pub synergy_attack_per_song: i32,
    pub synergy_damage_per_group: i32,
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            max_active: 3,
            cadence_rounds: 1,
            synergy_attack_per_song: 1,
            synergy_damage_per_group: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThreatConfig {
    /// Current target is kept while within this percent of the top threat.
    pub hysteresis_percent: u32,
    pub tank_multiplier_percent: u32,
    pub default_multiplier_percent: u32,
    /// Threat removed per round advance. Zero leaves tables untouched.
    pub decay_percent: u32,
    pub taunt_rounds: u32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            hysteresis_percent: 10,
            tank_multiplier_percent: 150,
            default_multiplier_percent: 100,
            decay_percent: 0,
            taunt_rounds: 2,
        }
    }
}

/// Order used among wards of equal priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WardTieBreak {
    /// Earlier-applied ward soaks first.
    #[default]
    InsertionOrder,
    LargestFirst,
    SmallestFirst,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WardConfig {
    pub tie_break: WardTieBreak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MitigationConfig {
    pub resist_cap_percent: u32,
    pub mitigation_cap_percent: u32,
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            resist_cap_percent: 75,
            mitigation_cap_percent: 90,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummonConfig {
    /// Outermost ring searched for a free placement cell.
    pub placement_radius: u32,
}

impl Default for SummonConfig {
    fn default() -> Self {
        Self {
            placement_radius: 5,
        }
    }
}

/// Decision engine tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AiTuning {
    pub dot_reuse_rounds: u32,
    pub debuff_reuse_rounds: u32,
    pub heal_threshold_percent: u32,
    pub melee_range: u32,
    /// Cells a combatant may step per turn before slow is applied.
    pub steps_per_turn: u32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            dot_reuse_rounds: 3,
            debuff_reuse_rounds: 5,
            heal_threshold_percent: 50,
            melee_range: 1,
            steps_per_turn: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HitConfig {
    pub base_percent: i32,
    pub min_percent: i32,
    pub max_percent: i32,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            base_percent: 75,
            min_percent: 5,
            max_percent: 95,
        }
    }
}
