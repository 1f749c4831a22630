//! Cooldown and haste tracking.
//!
//! A cooldown is keyed by ability id or by a shared group id and stores a
//! single readiness stamp: either an encounter-scoped `(round, turn)` or a
//! wall-clock millisecond value, never both.

use std::collections::BTreeMap;

use crate::config::HasteConfig;
use crate::state::{CombatClock, EncounterId};

/// What a cooldown is keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownKey<'a> {
    Ability(&'a str),
    Group(&'a str),
}

/// When a cooldown becomes ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CooldownStamp {
    /// Ready at `(round, turn)` of `encounter`.
    Turn {
        encounter: EncounterId,
        round: u32,
        turn: u32,
    },
    /// Ready once `now_ms >= ready_at_ms`.
    WallClock { ready_at_ms: u64 },
}

impl CooldownStamp {
    /// Round/turn stamps are treated expired outside their encounter.
    pub fn is_pending(&self, clock: &CombatClock) -> bool {
        match *self {
            CooldownStamp::Turn {
                encounter,
                round,
                turn,
            } => clock.encounter == Some(encounter) && (clock.round, clock.turn) < (round, turn),
            CooldownStamp::WallClock { ready_at_ms } => clock.now_ms < ready_at_ms,
        }
    }
}

/// Declared cooldown length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CooldownSpec {
    Rounds(u32),
    Millis(u64),
}

impl CooldownSpec {
    /// Readiness stamp for a use at `clock`.
    ///
    /// Round cooldowns stamped outside an encounter would be expired on
    /// arrival, so none is produced.
    pub fn stamp(&self, clock: &CombatClock) -> Option<CooldownStamp> {
        match *self {
            CooldownSpec::Rounds(0) => None,
            CooldownSpec::Rounds(rounds) => clock.encounter.map(|encounter| CooldownStamp::Turn {
                encounter,
                round: clock.round.saturating_add(rounds),
                turn: clock.turn,
            }),
            CooldownSpec::Millis(ms) => Some(CooldownStamp::WallClock {
                ready_at_ms: clock.now_ms.saturating_add(ms),
            }),
        }
    }
}

/// Per-combatant cooldowns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownMap {
    abilities: BTreeMap<String, CooldownStamp>,
    groups: BTreeMap<String, CooldownStamp>,
}

impl CooldownMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: CooldownKey<'_>) -> Option<&CooldownStamp> {
        match key {
            CooldownKey::Ability(id) => self.abilities.get(id),
            CooldownKey::Group(id) => self.groups.get(id),
        }
    }

    pub fn is_on_cooldown(&self, key: CooldownKey<'_>, clock: &CombatClock) -> bool {
        self.slot(key)
            .map(|stamp| stamp.is_pending(clock))
            .unwrap_or(false)
    }

    /// Stamps readiness for `key`. A spec that produces no stamp clears it.
    pub fn set_cooldown(&mut self, key: CooldownKey<'_>, spec: CooldownSpec, clock: &CombatClock) {
        let map = match key {
            CooldownKey::Ability(_) => &mut self.abilities,
            CooldownKey::Group(_) => &mut self.groups,
        };
        let id = match key {
            CooldownKey::Ability(id) | CooldownKey::Group(id) => id,
        };
        match spec.stamp(clock) {
            Some(stamp) => {
                map.insert(id.to_owned(), stamp);
            }
            None => {
                map.remove(id);
            }
        }
    }
}

/// Bonus actions granted by a haste percentage.
///
/// | haste | bonus |
/// |-------|-------|
/// | ≥100% | +4 |
/// | ≥75%  | +3 |
/// | ≥50%  | +2 |
/// | ≥25%  | +1 |
pub fn bonus_actions(haste_percent: u32, config: &HasteConfig) -> u32 {
    let bonus = match haste_percent {
        100.. => 4,
        75.. => 3,
        50.. => 2,
        25.. => 1,
        _ => 0,
    };
    bonus.min(config.max_bonus_actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENC: EncounterId = EncounterId(7);

    #[test]
    fn round_cooldown_tracks_round_and_turn() {
        let mut cooldowns = CooldownMap::new();
        let used_at = CombatClock::in_encounter(ENC, 2, 1);
        cooldowns.set_cooldown(CooldownKey::Ability("firebolt"), CooldownSpec::Rounds(2), &used_at);

        let key = CooldownKey::Ability("firebolt");
        assert!(cooldowns.is_on_cooldown(key, &CombatClock::in_encounter(ENC, 3, 5)));
        assert!(cooldowns.is_on_cooldown(key, &CombatClock::in_encounter(ENC, 4, 0)));
        assert!(!cooldowns.is_on_cooldown(key, &CombatClock::in_encounter(ENC, 4, 1)));
    }

    #[test]
    fn round_cooldown_expires_outside_encounter() {
        let mut cooldowns = CooldownMap::new();
        let used_at = CombatClock::in_encounter(ENC, 2, 1);
        cooldowns.set_cooldown(CooldownKey::Group("stuns"), CooldownSpec::Rounds(5), &used_at);

        let key = CooldownKey::Group("stuns");
        assert!(!cooldowns.is_on_cooldown(key, &CombatClock::idle(0)));
        assert!(!cooldowns.is_on_cooldown(key, &CombatClock::in_encounter(EncounterId(8), 1, 0)));
        assert!(cooldowns.is_on_cooldown(key, &used_at));
    }

    #[test]
    fn wall_clock_cooldown() {
        let mut cooldowns = CooldownMap::new();
        cooldowns.set_cooldown(
            CooldownKey::Ability("recall"),
            CooldownSpec::Millis(1_000),
            &CombatClock::idle(5_000),
        );
        let key = CooldownKey::Ability("recall");
        assert!(cooldowns.is_on_cooldown(key, &CombatClock::idle(5_999)));
        assert!(!cooldowns.is_on_cooldown(key, &CombatClock::idle(6_000)));
    }

    #[test]
    fn haste_thresholds() {
        let config = HasteConfig::default();
        assert_eq!(bonus_actions(0, &config), 0);
        assert_eq!(bonus_actions(24, &config), 0);
        assert_eq!(bonus_actions(25, &config), 1);
        assert_eq!(bonus_actions(50, &config), 2);
        assert_eq!(bonus_actions(99, &config), 3);
        assert_eq!(bonus_actions(250, &config), 4);

        let capped = HasteConfig {
            max_bonus_actions: 2,
        };
        assert_eq!(bonus_actions(100, &capped), 2);
    }
}
