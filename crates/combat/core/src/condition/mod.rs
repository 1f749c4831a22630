//! Condition ledger: per-combatant status conditions.
//!
//! Conditions gate behavior (acting, moving, casting) and carry optional
//! round-scoped expiry.
//!
//! # Round-scoped Duration
//!
//! Expiry is stored as a [`RoundStamp`] `(encounter, round)`. A condition is
//! deactivated by [`ConditionLedger::prune_expired`] once the round is reached
//! *in the same encounter*. Stamps from another encounter are inert: the
//! condition stays active until cleared directly.
//!
//! # Effect-derived Conditions
//!
//! Conditions implied by enabled passive effects are tagged `effect_derived`
//! and cleared by [`ConditionLedger::sync_from_effects`] once nothing implies
//! them. Directly-set conditions never auto-clear this way.

mod effects;

pub use effects::{ConditionMask, PassiveEffect};

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::config::CombatConfig;
use crate::state::{CombatClock, CombatantId, RoundStamp};

/// Slow percentage used when a slowed condition carries no metadata.
pub const DEFAULT_SLOW_PERCENT: u32 = 50;

/// Movement multiplier floor while slowed.
pub const MIN_MOVE_PERCENT: u32 = 10;

const CONDITION_SLOTS: usize = <ConditionKind as strum::EnumCount>::COUNT;

/// Types of status conditions.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    strum::IntoStaticStr,
    strum::EnumCount,
)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ConditionKind {
    /// Cannot cast.
    Muted,
    /// Cannot act at all. Breaks on damage.
    Mesmerized,
    /// Cannot move.
    Immobilized,
    /// Movement reduced.
    Slowed,
    /// Allegiance flipped to a charmer. Breaks on damage.
    Charmed,
    /// Cannot cast.
    Stunned,
}

impl ConditionKind {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Free-form condition metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConditionMeta {
    /// Movement reduction while slowed.
    pub slow_percent: Option<u32>,
    /// Break-on-damage chance override.
    pub break_percent: Option<u32>,
    pub tags: BTreeMap<String, String>,
}

impl ConditionMeta {
    pub fn slow(percent: u32) -> Self {
        Self {
            slow_percent: Some(percent),
            ..Self::default()
        }
    }

    pub fn break_chance(percent: u32) -> Self {
        Self {
            break_percent: Some(percent),
            ..Self::default()
        }
    }
}

/// How long a newly stamped condition lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionDuration {
    /// Expires `n` rounds after the current round.
    Rounds(u32),
    /// Expires at an explicit round of the current encounter.
    UntilRound(u32),
}

/// State of one condition slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionState {
    pub active: bool,
    pub source: Option<CombatantId>,
    pub expiry: Option<RoundStamp>,
    pub meta: ConditionMeta,
    pub effect_derived: bool,
}

/// All conditions of one combatant, one slot per [`ConditionKind`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionLedger {
    slots: [ConditionState; CONDITION_SLOTS],
}

/// Conditions changed by a ledger operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionChanges {
    pub activated: Vec<ConditionKind>,
    pub cleared: Vec<ConditionKind>,
}

impl ConditionChanges {
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.cleared.is_empty()
    }
}

impl ConditionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ConditionKind) -> &ConditionState {
        &self.slots[kind.index()]
    }

    pub fn is_active(&self, kind: ConditionKind) -> bool {
        self.slots[kind.index()].active
    }

    /// Stamps or clears a condition.
    ///
    /// Expiry is computed only when an encounter is active; outside an
    /// encounter the condition lasts until cleared.
    pub fn set(
        &mut self,
        kind: ConditionKind,
        active: bool,
        source: Option<CombatantId>,
        duration: Option<ConditionDuration>,
        meta: ConditionMeta,
        clock: &CombatClock,
    ) {
        let slot = &mut self.slots[kind.index()];
        if !active {
            *slot = ConditionState::default();
            return;
        }

        let expiry = duration.and_then(|duration| match duration {
            ConditionDuration::Rounds(rounds) => clock.rounds_from_now(rounds),
            ConditionDuration::UntilRound(round) => clock.at_round(round),
        });

        *slot = ConditionState {
            active: true,
            source,
            expiry,
            meta,
            effect_derived: false,
        };
    }

    /// Clears a condition immediately. Returns whether it was active.
    pub fn clear(&mut self, kind: ConditionKind) -> bool {
        let was_active = self.slots[kind.index()].active;
        self.slots[kind.index()] = ConditionState::default();
        was_active
    }

    /// Deactivates conditions whose expiry round was reached in the active
    /// encounter. Stale-encounter stamps are left untouched.
    pub fn prune_expired(&mut self, clock: &CombatClock) -> Vec<ConditionKind> {
        let mut cleared = Vec::new();
        for kind in ConditionKind::iter() {
            let slot = &mut self.slots[kind.index()];
            let reached = slot
                .expiry
                .map(|expiry| expiry.is_reached(clock))
                .unwrap_or(false);
            if slot.active && reached {
                *slot = ConditionState::default();
                cleared.push(kind);
            }
        }
        cleared
    }

    /// Recomputes effect-derived conditions from enabled passive effects.
    pub fn sync_from_effects(
        &mut self,
        passives: &[PassiveEffect],
        config: &CombatConfig,
    ) -> ConditionChanges {
        let mut implied = ConditionMask::empty();
        let mut slow_percent = None;
        for passive in passives.iter().filter(|p| p.enabled) {
            let mask = config.implied_by(&passive.key);
            if mask.contains(ConditionMask::SLOWED) && passive.slow_percent.is_some() {
                slow_percent = slow_percent.max(passive.slow_percent);
            }
            implied |= mask;
        }

        let mut changes = ConditionChanges::default();
        for kind in ConditionKind::iter() {
            let slot = &mut self.slots[kind.index()];
            let is_implied = implied.contains(ConditionMask::from_kind(kind));

            if is_implied {
                if slot.active && !slot.effect_derived {
                    // Directly set: keep it direct so it never auto-clears.
                    continue;
                }
                let meta = match kind {
                    ConditionKind::Slowed => ConditionMeta {
                        slow_percent,
                        ..ConditionMeta::default()
                    },
                    _ => ConditionMeta::default(),
                };
                if !slot.active {
                    changes.activated.push(kind);
                }
                *slot = ConditionState {
                    active: true,
                    source: None,
                    expiry: None,
                    meta,
                    effect_derived: true,
                };
            } else if slot.active && slot.effect_derived {
                *slot = ConditionState::default();
                changes.cleared.push(kind);
            }
        }
        changes
    }

    /// Iterates over active conditions.
    pub fn active(&self) -> impl Iterator<Item = (ConditionKind, &ConditionState)> + '_ {
        ConditionKind::iter()
            .map(move |kind| (kind, &self.slots[kind.index()]))
            .filter(|(_, slot)| slot.active)
    }

    // ========================================================================
    // Behavior gates
    // ========================================================================

    pub fn can_act(&self) -> bool {
        !self.is_active(ConditionKind::Mesmerized)
    }

    pub fn can_move(&self) -> bool {
        !self.is_active(ConditionKind::Mesmerized) && !self.is_active(ConditionKind::Immobilized)
    }

    pub fn can_cast(&self) -> bool {
        !self.is_active(ConditionKind::Mesmerized)
            && !self.is_active(ConditionKind::Stunned)
            && !self.is_active(ConditionKind::Muted)
    }

    /// Movement multiplier in percent, floored at [`MIN_MOVE_PERCENT`].
    pub fn move_multiplier_percent(&self) -> u32 {
        let slot = self.get(ConditionKind::Slowed);
        if !slot.active {
            return 100;
        }
        let slow = slot.meta.slow_percent.unwrap_or(DEFAULT_SLOW_PERCENT).min(100);
        (100 - slow).max(MIN_MOVE_PERCENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EncounterId;

    const A: EncounterId = EncounterId(1);
    const B: EncounterId = EncounterId(2);

    #[test]
    fn expiry_is_scoped_to_its_encounter() {
        let mut ledger = ConditionLedger::new();
        let stamped_at = CombatClock::in_encounter(A, 1, 0);
        ledger.set(
            ConditionKind::Mesmerized,
            true,
            None,
            Some(ConditionDuration::UntilRound(5)),
            ConditionMeta::default(),
            &stamped_at,
        );

        // Another encounter, well past round 5: stamp is inert.
        let cleared = ledger.prune_expired(&CombatClock::in_encounter(B, 10, 0));
        assert!(cleared.is_empty());
        assert!(ledger.is_active(ConditionKind::Mesmerized));

        // Original encounter, before round 5.
        assert!(ledger.prune_expired(&CombatClock::in_encounter(A, 4, 3)).is_empty());
        assert!(ledger.is_active(ConditionKind::Mesmerized));

        // Round 5 reached in encounter A.
        let cleared = ledger.prune_expired(&CombatClock::in_encounter(A, 5, 0));
        assert_eq!(cleared, vec![ConditionKind::Mesmerized]);
        assert!(!ledger.is_active(ConditionKind::Mesmerized));
    }

    #[test]
    fn no_expiry_outside_an_encounter() {
        let mut ledger = ConditionLedger::new();
        ledger.set(
            ConditionKind::Muted,
            true,
            Some(CombatantId(4)),
            Some(ConditionDuration::Rounds(2)),
            ConditionMeta::default(),
            &CombatClock::idle(0),
        );
        assert_eq!(ledger.get(ConditionKind::Muted).expiry, None);
        assert_eq!(ledger.get(ConditionKind::Muted).source, Some(CombatantId(4)));
    }

    #[test]
    fn gates_follow_conditions() {
        let clock = CombatClock::in_encounter(A, 1, 0);
        let mut ledger = ConditionLedger::new();
        assert!(ledger.can_act() && ledger.can_move() && ledger.can_cast());

        ledger.set(ConditionKind::Muted, true, None, None, ConditionMeta::default(), &clock);
        assert!(ledger.can_act());
        assert!(ledger.can_move());
        assert!(!ledger.can_cast());

        ledger.clear(ConditionKind::Muted);
        ledger.set(ConditionKind::Immobilized, true, None, None, ConditionMeta::default(), &clock);
        assert!(ledger.can_act());
        assert!(!ledger.can_move());
        assert!(ledger.can_cast());

        ledger.set(ConditionKind::Mesmerized, true, None, None, ConditionMeta::default(), &clock);
        assert!(!ledger.can_act());
        assert!(!ledger.can_cast());
    }

    #[test]
    fn slow_multiplier_is_floored() {
        let clock = CombatClock::in_encounter(A, 1, 0);
        let mut ledger = ConditionLedger::new();
        assert_eq!(ledger.move_multiplier_percent(), 100);

        ledger.set(ConditionKind::Slowed, true, None, None, ConditionMeta::slow(40), &clock);
        assert_eq!(ledger.move_multiplier_percent(), 60);

        ledger.set(ConditionKind::Slowed, true, None, None, ConditionMeta::slow(95), &clock);
        assert_eq!(ledger.move_multiplier_percent(), MIN_MOVE_PERCENT);

        ledger.set(ConditionKind::Slowed, true, None, None, ConditionMeta::default(), &clock);
        assert_eq!(ledger.move_multiplier_percent(), 100 - DEFAULT_SLOW_PERCENT);
    }

    #[test]
    fn effect_derived_conditions_follow_passives() {
        let mut config = CombatConfig::default();
        config
            .effect_conditions
            .insert("binding-roots".into(), vec![ConditionKind::Immobilized]);
        config
            .effect_conditions
            .insert("hush".into(), vec![ConditionKind::Muted]);

        let clock = CombatClock::in_encounter(A, 1, 0);
        let mut ledger = ConditionLedger::new();
        // Muted is set directly before the passive shows up.
        ledger.set(ConditionKind::Muted, true, None, None, ConditionMeta::default(), &clock);

        let mut passives = vec![
            PassiveEffect::new("binding-roots"),
            PassiveEffect::new("hush"),
        ];
        let changes = ledger.sync_from_effects(&passives, &config);
        assert_eq!(changes.activated, vec![ConditionKind::Immobilized]);
        assert!(ledger.get(ConditionKind::Immobilized).effect_derived);
        assert!(!ledger.get(ConditionKind::Muted).effect_derived);

        for passive in &mut passives {
            passive.enabled = false;
        }
        let changes = ledger.sync_from_effects(&passives, &config);
        assert_eq!(changes.cleared, vec![ConditionKind::Immobilized]);
        // The direct one survives.
        assert!(ledger.is_active(ConditionKind::Muted));
    }
}
