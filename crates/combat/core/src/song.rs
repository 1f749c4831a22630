//! Maintained-effect scheduler ("song twisting").
//!
//! A performer keeps up to `max_active` maintained effects. Each occupies a
//! category group; registering a second effect of the same group overwrites
//! the first, re-registering the same ability refreshes it, and a full set
//! evicts its oldest instance. Pulses re-resolve an instance's effects on a
//! fixed interval without spending resources.

use std::collections::BTreeSet;

use crate::catalog::SongSpec;
use crate::config::SongConfig;
use crate::error::{FailureReason, RuleResult};
use crate::state::{CombatBonuses, CombatClock, CombatantId, EncounterId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SongInstance {
    pub ability: String,
    pub group: String,
    /// Pulse target; `None` means the performer.
    pub target: Option<CombatantId>,
    pub encounter: EncounterId,
    pub start_round: u32,
    pub expires_round: u32,
    pub pulse_interval: u32,
    pub next_pulse: u32,
    pub priority: i32,
}

impl SongInstance {
    pub fn is_expired(&self, clock: &CombatClock) -> bool {
        clock.encounter != Some(self.encounter) || clock.round >= self.expires_round
    }
}

/// The most recently started performance, for the cadence gate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Performance {
    pub ability: String,
    pub encounter: EncounterId,
    pub round: u32,
}

/// Result of a successful registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongRegistration {
    /// Removed because they shared the ability or the group.
    pub replaced: Vec<SongInstance>,
    /// Removed to make room.
    pub evicted: Vec<SongInstance>,
}

/// Result of one pulse pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongPulse {
    pub expired: Vec<SongInstance>,
    /// Instances whose effects should be re-resolved now.
    pub due: Vec<SongInstance>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SongBook {
    /// Oldest first.
    instances: Vec<SongInstance>,
    current: Option<Performance>,
    synergy: CombatBonuses,
}

impl SongBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instances(&self) -> &[SongInstance] {
        &self.instances
    }

    pub fn current(&self) -> Option<&Performance> {
        self.current.as_ref()
    }

    pub fn synergy(&self) -> CombatBonuses {
        self.synergy
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Rejects with `cadence` when a performance started fewer than
    /// `cadence_rounds` ago in the active encounter.
    pub fn check_cadence(&self, clock: &CombatClock, config: &SongConfig) -> RuleResult<()> {
        let Some(current) = &self.current else {
            return Ok(());
        };
        let too_soon = clock.encounter == Some(current.encounter)
            && clock.round < current.round.saturating_add(config.cadence_rounds);
        if too_soon {
            Err(FailureReason::Cadence)
        } else {
            Ok(())
        }
    }

    pub fn register(
        &mut self,
        ability: &str,
        spec: &SongSpec,
        target: Option<CombatantId>,
        clock: &CombatClock,
        config: &SongConfig,
    ) -> RuleResult<SongRegistration> {
        let encounter = clock.encounter.ok_or(FailureReason::PrereqNotMet)?;
        self.check_cadence(clock, config)?;

        let mut registration = SongRegistration::default();
        let (replaced, kept): (Vec<_>, Vec<_>) = self
            .instances
            .drain(..)
            .partition(|instance| instance.ability == ability || instance.group == spec.group);
        self.instances = kept;
        registration.replaced = replaced;

        let capacity = config.max_active.max(1);
        while self.instances.len() >= capacity {
            registration.evicted.push(self.instances.remove(0));
        }

        let interval = spec.pulse_interval.max(1);
        self.instances.push(SongInstance {
            ability: ability.to_owned(),
            group: spec.group.clone(),
            target,
            encounter,
            start_round: clock.round,
            expires_round: clock.round.saturating_add(spec.duration_rounds),
            pulse_interval: interval,
            next_pulse: clock.round.saturating_add(interval),
            priority: spec.priority,
        });
        self.current = Some(Performance {
            ability: ability.to_owned(),
            encounter,
            round: clock.round,
        });
        self.recompute_synergy(config);
        Ok(registration)
    }

    /// Prunes expired instances, then reschedules and returns due ones.
    pub fn pulse(&mut self, clock: &CombatClock, config: &SongConfig) -> SongPulse {
        let (expired, live): (Vec<_>, Vec<_>) = self
            .instances
            .drain(..)
            .partition(|instance| instance.is_expired(clock));
        self.instances = live;

        let mut due = Vec::new();
        for instance in &mut self.instances {
            if instance.next_pulse <= clock.round {
                instance.next_pulse = clock.round.saturating_add(instance.pulse_interval);
                due.push(instance.clone());
            }
        }

        if !expired.is_empty() {
            self.recompute_synergy(config);
        }
        SongPulse { expired, due }
    }

    /// Stops one maintained effect.
    pub fn stop(&mut self, ability: &str, config: &SongConfig) -> Option<SongInstance> {
        let index = self.instances.iter().position(|i| i.ability == ability)?;
        let removed = self.instances.remove(index);
        self.recompute_synergy(config);
        Some(removed)
    }

    /// Drops everything, including the cadence pointer.
    pub fn clear(&mut self) -> Vec<SongInstance> {
        self.current = None;
        self.synergy = CombatBonuses::default();
        core::mem::take(&mut self.instances)
    }

    fn recompute_synergy(&mut self, config: &SongConfig) {
        let count = self.instances.len() as i32;
        let groups = self
            .instances
            .iter()
            .map(|i| i.group.as_str())
            .collect::<BTreeSet<_>>()
            .len() as i32;
        self.synergy = CombatBonuses {
            attack: count * config.synergy_attack_per_song,
            damage: groups * config.synergy_damage_per_group,
            ..CombatBonuses::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENC: EncounterId = EncounterId(1);

    fn spec(group: &str) -> SongSpec {
        SongSpec {
            group: group.into(),
            duration_rounds: 6,
            pulse_interval: 2,
            priority: 0,
            effects: Vec::new(),
        }
    }

    fn at(round: u32) -> CombatClock {
        CombatClock::in_encounter(ENC, round, 0)
    }

    #[test]
    fn capacity_evicts_the_oldest() {
        let config = SongConfig::default();
        let mut book = SongBook::new();
        for (round, (ability, group)) in [
            ("war-march", "march"),
            ("ember-hymn", "hymn"),
            ("frost-dirge", "dirge"),
            ("stone-chant", "chant"),
        ]
        .into_iter()
        .enumerate()
        {
            let registration = book
                .register(ability, &spec(group), None, &at(round as u32 + 1), &config)
                .unwrap();
            if round == 3 {
                assert_eq!(registration.evicted.len(), 1);
                assert_eq!(registration.evicted[0].ability, "war-march");
            } else {
                assert!(registration.evicted.is_empty());
            }
        }
        let abilities: Vec<_> = book.instances().iter().map(|i| i.ability.as_str()).collect();
        assert_eq!(abilities, ["ember-hymn", "frost-dirge", "stone-chant"]);
    }

    #[test]
    fn cadence_gate_rejects_same_round() {
        let config = SongConfig::default();
        let mut book = SongBook::new();
        book.register("war-march", &spec("march"), None, &at(1), &config)
            .unwrap();
        assert_eq!(
            book.register("ember-hymn", &spec("hymn"), None, &at(1), &config),
            Err(FailureReason::Cadence)
        );
        assert!(book
            .register("ember-hymn", &spec("hymn"), None, &at(2), &config)
            .is_ok());
    }

    #[test]
    fn same_group_overwrites_and_same_ability_refreshes() {
        let config = SongConfig::default();
        let mut book = SongBook::new();
        book.register("war-march", &spec("march"), None, &at(1), &config)
            .unwrap();
        let overwrite = book
            .register("battle-march", &spec("march"), None, &at(2), &config)
            .unwrap();
        assert_eq!(overwrite.replaced.len(), 1);
        assert_eq!(book.instances().len(), 1);

        let refresh = book
            .register("battle-march", &spec("march"), None, &at(3), &config)
            .unwrap();
        assert_eq!(refresh.replaced[0].start_round, 2);
        assert_eq!(book.instances()[0].expires_round, 9);
    }

    #[test]
    fn pulse_reschedules_and_prunes() {
        let config = SongConfig::default();
        let mut book = SongBook::new();
        book.register("war-march", &spec("march"), None, &at(1), &config)
            .unwrap();
        assert!(book.pulse(&at(2), &config).due.is_empty());
        let pulse = book.pulse(&at(3), &config);
        assert_eq!(pulse.due.len(), 1);
        assert_eq!(book.instances()[0].next_pulse, 5);

        let pulse = book.pulse(&at(7), &config);
        assert_eq!(pulse.expired.len(), 1);
        assert!(book.is_empty());
        assert_eq!(book.synergy(), CombatBonuses::default());
    }

    #[test]
    fn synergy_counts_songs_and_groups() {
        let config = SongConfig {
            synergy_attack_per_song: 2,
            synergy_damage_per_group: 3,
            ..SongConfig::default()
        };
        let mut book = SongBook::new();
        book.register("a", &spec("march"), None, &at(1), &config).unwrap();
        book.register("b", &spec("hymn"), None, &at(2), &config).unwrap();
        assert_eq!(book.synergy().attack, 4);
        assert_eq!(book.synergy().damage, 6);
    }

    #[test]
    fn stale_encounter_instances_expire() {
        let config = SongConfig::default();
        let mut book = SongBook::new();
        book.register("a", &spec("march"), None, &at(1), &config).unwrap();
        let pulse = book.pulse(&CombatClock::in_encounter(EncounterId(2), 1, 0), &config);
        assert_eq!(pulse.expired.len(), 1);
    }
}
