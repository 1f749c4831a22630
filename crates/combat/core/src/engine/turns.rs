//! Encounter lifecycle and the turn-advance trigger.

use crate::charm::ReleaseReason;
use crate::condition::{ConditionDuration, ConditionKind, ConditionMeta};
use crate::error::{FailureReason, RuleResult};
use crate::events::CombatEvent;
use crate::state::{CombatClock, CombatantId, EncounterId};
use crate::summon::DespawnReason;

use super::CombatEngine;

/// What one turn advance did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TurnReport {
    pub new_round: bool,
    pub conditions_cleared: usize,
    pub summons_expired: usize,
    pub charms_released: usize,
    pub songs_pulsed: usize,
}

impl CombatEngine<'_> {
    pub fn begin_encounter(&mut self, encounter: EncounterId, now_ms: u64) {
        self.state.clock = CombatClock::in_encounter(encounter, 1, 0).with_now(now_ms);
        let clock = self.state.clock;
        for combatant in self.state.roster.iter_mut() {
            combatant.memory.forget_stale(&clock);
        }
        self.emit(CombatEvent::EncounterStarted { encounter });
    }

    /// Leaves the active encounter. Maintained effects stop; round-stamped
    /// state from the encounter becomes stale.
    pub fn end_encounter(&mut self, now_ms: u64) -> RuleResult<()> {
        let encounter = self.state.clock.encounter.ok_or(FailureReason::PrereqNotMet)?;

        let mut stopped = Vec::new();
        for combatant in self.state.roster.iter_mut() {
            if let Some(songs) = combatant.songs.as_mut() {
                for instance in songs.clear() {
                    stopped.push((combatant.id, instance.ability));
                }
                combatant.bonuses.synergy = Default::default();
            }
        }
        for (performer, ability) in stopped {
            self.emit(CombatEvent::SongExpired { performer, ability });
        }

        self.state.clock = CombatClock::idle(now_ms);
        self.emit(CombatEvent::EncounterEnded { encounter });
        Ok(())
    }

    /// Advances the clock to `(round, turn)` and runs every per-turn trigger.
    ///
    /// Every turn: expired conditions are pruned, effect-derived conditions
    /// re-synced and expired taunt overrides cleared. On a round change:
    /// expired charms release, expired summons despawn, maintained effects
    /// pulse and threat decays.
    pub fn advance_turn(&mut self, round: u32, turn: u32, now_ms: u64) -> RuleResult<TurnReport> {
        let encounter = self.state.clock.encounter.ok_or(FailureReason::PrereqNotMet)?;
        let new_round = round != self.state.clock.round;
        self.state.clock = CombatClock::in_encounter(encounter, round, turn).with_now(now_ms);
        self.emit(CombatEvent::TurnAdvanced {
            encounter,
            round,
            turn,
            new_round,
        });

        let mut report = TurnReport {
            new_round,
            ..TurnReport::default()
        };

        for id in self.state.roster.ids() {
            report.conditions_cleared += self.refresh_conditions(id)?;
            self.clear_expired_taunt(id);
        }

        if new_round {
            report.charms_released = self.release_expired_charms()?;
            report.summons_expired = self.expire_summons()?;
            report.songs_pulsed = self.pulse_songs()?;
            let decay = self.env.config.threat.decay_percent;
            for combatant in self.state.roster.iter_mut() {
                if let Some(table) = combatant.threat.as_mut() {
                    table.decay(decay);
                }
            }
        }

        Ok(report)
    }

    /// Stamps or clears one condition directly.
    pub fn set_condition(
        &mut self,
        target: CombatantId,
        kind: ConditionKind,
        active: bool,
        source: Option<CombatantId>,
        duration: Option<ConditionDuration>,
        meta: ConditionMeta,
    ) -> RuleResult<()> {
        let clock = self.state.clock;
        let combatant = self.combatant_mut(target)?;
        let was_active = combatant.conditions.is_active(kind);
        combatant
            .conditions
            .set(kind, active, source, duration, meta, &clock);

        if active {
            self.emit(CombatEvent::ConditionApplied {
                target,
                kind,
                source,
            });
        } else if was_active {
            self.emit(CombatEvent::ConditionCleared { target, kind });
            if kind == ConditionKind::Charmed && self.combatant(target)?.charm.is_some() {
                self.release_charm(target, ReleaseReason::Dismissed)?;
            }
        }
        Ok(())
    }

    /// Re-derives effect-driven conditions from the combatant's passives.
    pub fn sync_effects(&mut self, target: CombatantId) -> RuleResult<()> {
        let config = self.env.config;
        let combatant = self.combatant_mut(target)?;
        let changes = combatant
            .conditions
            .sync_from_effects(&combatant.passives, config);
        for kind in changes.activated {
            self.emit(CombatEvent::ConditionApplied {
                target,
                kind,
                source: None,
            });
        }
        for kind in changes.cleared {
            self.emit(CombatEvent::ConditionCleared { target, kind });
        }
        Ok(())
    }

    fn refresh_conditions(&mut self, id: CombatantId) -> RuleResult<usize> {
        let clock = self.state.clock;
        let cleared = self.combatant_mut(id)?.conditions.prune_expired(&clock);
        let count = cleared.len();
        for kind in cleared {
            self.emit(CombatEvent::ConditionCleared { target: id, kind });
            if kind == ConditionKind::Charmed && self.combatant(id)?.charm.is_some() {
                self.release_charm(id, ReleaseReason::Expired)?;
            }
        }
        self.sync_effects(id)?;
        Ok(count)
    }

    fn clear_expired_taunt(&mut self, id: CombatantId) {
        let clock = self.state.clock;
        let cleared = self
            .state
            .roster
            .get_mut(id)
            .and_then(|c| c.threat.as_mut())
            .and_then(|table| table.clear_expired_forced_target(&clock));
        if let Some(forced) = cleared {
            self.emit(CombatEvent::ForcedTargetCleared {
                hostile: id,
                target: forced.target,
            });
        }
    }

    fn release_expired_charms(&mut self) -> RuleResult<usize> {
        let clock = self.state.clock;
        let expired: Vec<CombatantId> = self
            .state
            .roster
            .iter()
            .filter(|c| c.charm.as_ref().map(|r| r.is_expired(&clock)).unwrap_or(false))
            .map(|c| c.id)
            .collect();
        for id in &expired {
            self.release_charm(*id, ReleaseReason::Expired)?;
        }
        Ok(expired.len())
    }

    fn expire_summons(&mut self) -> RuleResult<usize> {
        let clock = self.state.clock;
        let expired: Vec<CombatantId> = self
            .state
            .roster
            .iter()
            .filter(|c| {
                c.summon
                    .as_ref()
                    .map(|r| r.active && !r.is_charm() && r.is_expired(&clock))
                    .unwrap_or(false)
            })
            .map(|c| c.id)
            .collect();
        for id in &expired {
            self.despawn(*id, DespawnReason::Expired)?;
        }
        Ok(expired.len())
    }

    /// Pulses every performer's maintained effects. Pulses spend nothing.
    fn pulse_songs(&mut self) -> RuleResult<usize> {
        let clock = self.state.clock;
        let catalog = self.env.catalog;
        let songs_config = self.env.config.songs;
        let performers: Vec<CombatantId> = self
            .state
            .roster
            .iter()
            .filter(|c| c.active && c.songs.as_ref().map(|b| !b.is_empty()).unwrap_or(false))
            .map(|c| c.id)
            .collect();

        let mut pulsed = 0;
        for performer in performers {
            let combatant = self.combatant_mut(performer)?;
            let Some(book) = combatant.songs.as_mut() else {
                continue;
            };
            let pulse = book.pulse(&clock, &songs_config);
            combatant.bonuses.synergy = book.synergy();

            for instance in pulse.expired {
                self.emit(CombatEvent::SongExpired {
                    performer,
                    ability: instance.ability,
                });
            }

            for instance in pulse.due {
                let Some(spec) = catalog.song(&instance.ability) else {
                    continue;
                };
                let target = instance.target.unwrap_or(performer);
                let target_present = self
                    .state
                    .roster
                    .get(target)
                    .map(|c| c.is_present())
                    .unwrap_or(false);
                if !target_present {
                    continue;
                }
                let caster = self.combatant(performer)?;
                let rank = caster.rank_of(&instance.ability).unwrap_or(1);
                let level = caster.level;
                self.emit(CombatEvent::SongPulsed {
                    performer,
                    ability: instance.ability.clone(),
                    target,
                });
                self.resolve_effects(performer, target, &instance.ability, &spec.effects, level, rank);
                pulsed += 1;
            }
        }
        Ok(pulsed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::Fixture;
    use super::*;
    use crate::condition::PassiveEffect;
    use crate::engine::CombatEngine;
    use crate::state::{Allegiance, CombatState, Combatant, Position};

    #[test]
    fn conditions_expire_on_their_round() {
        let fixture = Fixture::new();
        let mut state = CombatState::new();
        let orc = state.spawn(Combatant::new("orc", Allegiance::Hostile, 50, 0).at(Position::ORIGIN));
        let mut engine = CombatEngine::new(&mut state, fixture.env());
        engine.begin_encounter(EncounterId(1), 0);
        engine
            .set_condition(
                orc,
                ConditionKind::Immobilized,
                true,
                None,
                Some(ConditionDuration::Rounds(2)),
                ConditionMeta::default(),
            )
            .unwrap();

        let report = engine.advance_turn(2, 0, 10).unwrap();
        assert!(report.new_round);
        assert_eq!(report.conditions_cleared, 0);
        assert!(engine.combatant(orc).unwrap().conditions.is_active(ConditionKind::Immobilized));

        let report = engine.advance_turn(3, 0, 20).unwrap();
        assert_eq!(report.conditions_cleared, 1);
        assert!(!engine.combatant(orc).unwrap().conditions.is_active(ConditionKind::Immobilized));
    }

    #[test]
    fn same_round_turns_skip_round_triggers() {
        let fixture = Fixture::new();
        let mut state = CombatState::new();
        let mut engine = CombatEngine::new(&mut state, fixture.env());
        engine.begin_encounter(EncounterId(1), 0);
        assert!(!engine.advance_turn(1, 1, 0).unwrap().new_round);
        assert!(engine.advance_turn(2, 0, 0).unwrap().new_round);
    }

    #[test]
    fn advance_requires_an_encounter() {
        let fixture = Fixture::new();
        let mut state = CombatState::new();
        let mut engine = CombatEngine::new(&mut state, fixture.env());
        assert_eq!(engine.advance_turn(1, 0, 0), Err(FailureReason::PrereqNotMet));
        assert_eq!(engine.end_encounter(0), Err(FailureReason::PrereqNotMet));
    }

    #[test]
    fn passives_drive_effect_derived_conditions() {
        let mut fixture = Fixture::new();
        fixture
            .config
            .effect_conditions
            .insert("frost-aura".into(), vec![ConditionKind::Slowed]);
        let mut state = CombatState::new();
        let hero = state.spawn(Combatant::new("hero", Allegiance::Player, 50, 0).at(Position::ORIGIN));
        if let Some(hero) = state.roster.get_mut(hero) {
            hero.passives.push(PassiveEffect::new("frost-aura").with_slow(30));
        }

        let mut engine = CombatEngine::new(&mut state, fixture.env());
        engine.sync_effects(hero).unwrap();
        let conditions = &engine.combatant(hero).unwrap().conditions;
        assert!(conditions.is_active(ConditionKind::Slowed));
        assert_eq!(conditions.move_multiplier_percent(), 70);
    }
}
