//! Per-combatant AI configuration and memory.

use crate::state::{CombatClock, CombatantId, RoundStamp};

/// Pet behavior mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AiMode {
    /// Never acts on its own.
    Passive,
    /// Mirrors the owner's target.
    #[default]
    Assist,
    /// Engages the nearest hostile within aggression radius.
    Guard,
    /// Same target acquisition as guard, without waiting on the owner.
    Autonomous,
}

/// Combat role. Tanks generate extra threat and taunt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Role {
    Tank,
    #[default]
    Damage,
    Support,
}

/// Behavior configuration, editable by the owner through the request
/// protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AiConfig {
    pub enabled: bool,
    pub mode: AiMode,
    pub prefers_casting: bool,
    /// Keep casting while an enemy is adjacent.
    pub cast_while_engaged: bool,
    pub aggression_radius: u32,
    pub follow_distance: u32,
    /// Maximum distance from the anchor (owner for pets, home for hostiles).
    pub leash_radius: Option<u32>,
    pub hold_while_engaged: bool,
    pub auto_taunt: bool,
    pub rotation_profile: Option<String>,
    pub nickname: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: AiMode::default(),
            prefers_casting: false,
            cast_while_engaged: true,
            aggression_radius: 8,
            follow_distance: 2,
            leash_radius: None,
            hold_while_engaged: false,
            auto_taunt: true,
            rotation_profile: None,
            nickname: None,
        }
    }
}

impl AiConfig {
    pub fn apply(&mut self, change: &PetConfigChange) {
        match change {
            PetConfigChange::Mode(mode) => self.mode = *mode,
            PetConfigChange::Enabled(enabled) => self.enabled = *enabled,
            PetConfigChange::FollowDistance(distance) => self.follow_distance = *distance,
            PetConfigChange::AutoTaunt(auto_taunt) => self.auto_taunt = *auto_taunt,
            PetConfigChange::RotationProfile(profile) => self.rotation_profile = profile.clone(),
            PetConfigChange::Nickname(nickname) => self.nickname = nickname.clone(),
        }
    }

    /// Whether the decision engine should act for this combatant at all.
    pub fn is_driving(&self) -> bool {
        self.enabled && self.mode != AiMode::Passive
    }
}

/// One whitelisted pet configuration change.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PetConfigChange {
    Mode(AiMode),
    Enabled(bool),
    FollowDistance(u32),
    AutoTaunt(bool),
    RotationProfile(Option<String>),
    Nickname(Option<String>),
}

/// A recorded ability use against a target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationUse {
    pub ability: String,
    pub target: CombatantId,
    pub at: RoundStamp,
}

/// Decision-engine memory carried between turns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AiMemory {
    pub target: Option<CombatantId>,
    pub last_taunt: Option<RoundStamp>,
    pub uses: Vec<RotationUse>,
}

impl AiMemory {
    /// True when `ability` was used on `target` fewer than `guard_rounds`
    /// rounds ago in the active encounter.
    pub fn recently_used(
        &self,
        ability: &str,
        target: CombatantId,
        guard_rounds: u32,
        clock: &CombatClock,
    ) -> bool {
        self.uses.iter().any(|entry| {
            entry.ability == ability
                && entry.target == target
                && !entry.at.is_stale(clock)
                && clock.round < entry.at.round.saturating_add(guard_rounds)
        })
    }

    pub fn record_use(&mut self, ability: &str, target: CombatantId, clock: &CombatClock) {
        let Some(at) = clock.at_round(clock.round) else {
            return;
        };
        self.uses
            .retain(|entry| !(entry.ability == ability && entry.target == target));
        self.uses.push(RotationUse {
            ability: ability.to_owned(),
            target,
            at,
        });
    }

    pub fn taunted_this_round(&self, clock: &CombatClock) -> bool {
        self.last_taunt
            .map(|stamp| !stamp.is_stale(clock) && stamp.round == clock.round)
            .unwrap_or(false)
    }

    /// Drops entries from other encounters.
    pub fn forget_stale(&mut self, clock: &CombatClock) {
        self.uses.retain(|entry| !entry.at.is_stale(clock));
        if self.last_taunt.map(|t| t.is_stale(clock)).unwrap_or(false) {
            self.last_taunt = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EncounterId;

    #[test]
    fn reuse_guard_spans_rounds() {
        let enc = EncounterId(1);
        let mut memory = AiMemory::default();
        memory.record_use("poison-bolt", CombatantId(5), &CombatClock::in_encounter(enc, 2, 0));

        let at = |round| CombatClock::in_encounter(enc, round, 0);
        assert!(memory.recently_used("poison-bolt", CombatantId(5), 3, &at(4)));
        assert!(!memory.recently_used("poison-bolt", CombatantId(5), 3, &at(5)));
        assert!(!memory.recently_used("poison-bolt", CombatantId(6), 3, &at(3)));
        assert!(!memory.recently_used(
            "poison-bolt",
            CombatantId(5),
            3,
            &CombatClock::in_encounter(EncounterId(2), 2, 0)
        ));
    }

    #[test]
    fn config_changes_apply() {
        let mut config = AiConfig::default();
        config.apply(&PetConfigChange::Mode(AiMode::Guard));
        config.apply(&PetConfigChange::Nickname(Some("Biscuit".into())));
        assert_eq!(config.mode, AiMode::Guard);
        assert_eq!(config.nickname.as_deref(), Some("Biscuit"));

        config.apply(&PetConfigChange::Mode(AiMode::Passive));
        assert!(!config.is_driving());
    }
}
