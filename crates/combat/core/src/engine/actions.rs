//! Casting, maintained effects, melee and movement.

use crate::catalog::{EffectSpec, TargetKind};
use crate::combat::{DamageRequest, Ward, calculate_hit_chance};
use crate::condition::{ConditionDuration, ConditionKind};
use crate::cooldown::{CooldownKey, bonus_actions};
use crate::error::{FailureReason, RuleResult};
use crate::events::CombatEvent;
use crate::movement::{Leash, MoveLimits, MovePlan, distance, plan_approach, step_budget};
use crate::roll::RollKey;
use crate::state::{CombatantId, Position};

use super::{CombatEngine, DamageOptions, DamageOutcome};

/// A validated cast, ready to commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastPlan {
    pub caster: CombatantId,
    pub ability: String,
    pub target: CombatantId,
    pub rank: u32,
    /// Starts a maintained effect instead of resolving once.
    pub is_song: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CastOutcome {
    pub damage: Vec<DamageOutcome>,
    /// Maintained effects removed by a song registration.
    pub replaced: Vec<String>,
    pub evicted: Vec<String>,
    /// Declared effects that could not apply.
    pub failed: Vec<EffectFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectFailure {
    pub effect: &'static str,
    pub reason: FailureReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeleeOutcome {
    Hit(DamageOutcome),
    Missed { chance: u32 },
}

impl MeleeOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, MeleeOutcome::Hit(_))
    }
}

impl CombatEngine<'_> {
    /// Checks every precondition of a cast without mutating anything.
    pub fn validate_cast(
        &self,
        caster: CombatantId,
        ability: &str,
        target: Option<CombatantId>,
    ) -> RuleResult<CastPlan> {
        let catalog = self.env.catalog;
        let clock = &self.state.clock;

        let caster_state = self.combatant(caster)?;
        let spec = catalog.ability(ability).ok_or(FailureReason::CatalogNotFound)?;
        let rank = caster_state
            .rank_of(ability)
            .ok_or(FailureReason::PrereqNotMet)?;

        if !caster_state.is_present() || !caster_state.conditions.can_act() {
            return Err(FailureReason::CannotAct);
        }
        if !caster_state.conditions.can_cast() {
            return Err(FailureReason::CannotCast);
        }

        let cooling = caster_state
            .cooldowns
            .is_on_cooldown(CooldownKey::Ability(ability), clock)
            || spec
                .group
                .as_deref()
                .map(|group| {
                    caster_state
                        .cooldowns
                        .is_on_cooldown(CooldownKey::Group(group), clock)
                })
                .unwrap_or(false);
        if cooling {
            return Err(FailureReason::CooldownActive);
        }
        if caster_state.resources.mana.current < spec.mana_cost {
            return Err(FailureReason::InsufficientMana);
        }

        let target_id = match spec.target {
            TargetKind::Caster => caster,
            TargetKind::Ally => target.unwrap_or(caster),
            TargetKind::Enemy => target.ok_or(FailureReason::NoTarget)?,
        };
        let target_state = self
            .state
            .roster
            .get(target_id)
            .filter(|c| c.is_present())
            .ok_or(FailureReason::NoTarget)?;
        let valid_side = match spec.target {
            TargetKind::Caster => true,
            TargetKind::Ally => !caster_state.opposes(target_state),
            TargetKind::Enemy => caster_state.opposes(target_state),
        };
        if !valid_side {
            return Err(FailureReason::NoTarget);
        }

        if let (Some(from), Some(to)) = (caster_state.position, target_state.position) {
            if target_id != caster && distance(from, to) > spec.range {
                return Err(FailureReason::OutOfRange);
            }
        }

        let is_song = catalog.song(ability).is_some();
        if is_song {
            let book = caster_state
                .songs
                .as_ref()
                .ok_or(FailureReason::PrereqNotMet)?;
            if !clock.is_active() {
                return Err(FailureReason::PrereqNotMet);
            }
            book.check_cadence(clock, &self.env.config.songs)?;
        }

        Ok(CastPlan {
            caster,
            ability: ability.to_owned(),
            target: target_id,
            rank,
            is_song,
        })
    }

    /// Commits a validated cast: spends mana, stamps cooldowns, then
    /// registers the maintained effect or resolves the ability's effects.
    ///
    /// The plan is re-validated first, since state may have moved between
    /// validation and commit.
    pub fn commit_cast(&mut self, plan: &CastPlan) -> RuleResult<CastOutcome> {
        let plan = self.validate_cast(plan.caster, &plan.ability, Some(plan.target))?;
        let catalog = self.env.catalog;
        let config = self.env.config;
        let clock = self.state.clock;
        let spec = catalog
            .ability(&plan.ability)
            .ok_or(FailureReason::CatalogNotFound)?;

        let caster = self.combatant_mut(plan.caster)?;
        if !caster.resources.mana.try_spend(spec.mana_cost) {
            return Err(FailureReason::InsufficientMana);
        }
        if let Some(cooldown) = spec.cooldown {
            caster
                .cooldowns
                .set_cooldown(CooldownKey::Ability(&plan.ability), cooldown, &clock);
            if let Some(group) = spec.group.as_deref() {
                caster
                    .cooldowns
                    .set_cooldown(CooldownKey::Group(group), cooldown, &clock);
            }
        }
        let level = caster.level;

        self.emit(CombatEvent::AbilityCast {
            caster: plan.caster,
            ability: plan.ability.clone(),
            target: plan.target,
        });

        let mut outcome = CastOutcome::default();
        if plan.is_song {
            let song = catalog
                .song(&plan.ability)
                .ok_or(FailureReason::CatalogNotFound)?;
            let stored_target = (plan.target != plan.caster).then_some(plan.target);
            let caster = self.combatant_mut(plan.caster)?;
            let book = caster.songs.as_mut().ok_or(FailureReason::PrereqNotMet)?;
            let registration =
                book.register(&plan.ability, song, stored_target, &clock, &config.songs)?;
            caster.bonuses.synergy = book.synergy();

            for instance in registration.evicted {
                self.emit(CombatEvent::SongEvicted {
                    performer: plan.caster,
                    ability: instance.ability.clone(),
                });
                outcome.evicted.push(instance.ability);
            }
            outcome.replaced = registration
                .replaced
                .into_iter()
                .map(|instance| instance.ability)
                .collect();
            self.emit(CombatEvent::SongRegistered {
                performer: plan.caster,
                ability: plan.ability.clone(),
            });
        } else {
            (outcome.damage, outcome.failed) = self.resolve_effects(
                plan.caster,
                plan.target,
                &plan.ability,
                &spec.effects,
                level,
                plan.rank,
            );
        }
        Ok(outcome)
    }

    pub fn cast(
        &mut self,
        caster: CombatantId,
        ability: &str,
        target: Option<CombatantId>,
    ) -> RuleResult<CastOutcome> {
        let plan = self.validate_cast(caster, ability, target)?;
        self.commit_cast(&plan)
    }

    /// Stops one of the performer's maintained effects.
    pub fn stop_song(&mut self, performer: CombatantId, ability: &str) -> RuleResult<()> {
        let config = self.env.config;
        let combatant = self.combatant_mut(performer)?;
        let book = combatant.songs.as_mut().ok_or(FailureReason::PrereqNotMet)?;
        let stopped = book
            .stop(ability, &config.songs)
            .ok_or(FailureReason::NotFound)?;
        combatant.bonuses.synergy = book.synergy();
        self.emit(CombatEvent::SongExpired {
            performer,
            ability: stopped.ability,
        });
        Ok(())
    }

    /// Resolves declared effects from `source` onto `target`.
    ///
    /// Heals, mana, conditions and wards on a target that is gone are
    /// skipped, as is a ward with no free slot. Any other refusal is emitted
    /// as `EffectFailed` and returned; the rest still resolve.
    pub(crate) fn resolve_effects(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: &str,
        effects: &[EffectSpec],
        level: u32,
        rank: u32,
    ) -> (Vec<DamageOutcome>, Vec<EffectFailure>) {
        let mut damage = Vec::new();
        let mut failed = Vec::new();
        for effect in effects {
            let result = match effect {
                EffectSpec::Damage {
                    kind,
                    category,
                    amount,
                } => {
                    let request = DamageRequest::new(target)
                        .from(source)
                        .part(*kind, *category, amount.resolve(level, rank))
                        .ability(ability);
                    self.apply_damage(request, DamageOptions::default())
                        .map(|outcome| damage.push(outcome))
                }
                EffectSpec::Heal { amount } => {
                    if let Some(combatant) = self.present_mut(target) {
                        let healed = combatant.resources.hp.restore(amount.resolve(level, rank));
                        if healed > 0 {
                            self.emit(CombatEvent::Healed {
                                target,
                                amount: healed,
                            });
                        }
                    }
                    Ok(())
                }
                EffectSpec::RestoreMana { amount } => {
                    if let Some(combatant) = self.present_mut(target) {
                        combatant.resources.mana.restore(amount.resolve(level, rank));
                    }
                    Ok(())
                }
                EffectSpec::ApplyCondition { kind, rounds, meta } => {
                    if *kind == ConditionKind::Charmed {
                        self.apply_charm(source, target, rounds.unwrap_or(1))
                    } else if self.present_mut(target).is_some() {
                        self.set_condition(
                            target,
                            *kind,
                            true,
                            Some(source),
                            rounds.map(ConditionDuration::Rounds),
                            meta.clone(),
                        )
                    } else {
                        Ok(())
                    }
                }
                EffectSpec::RemoveCondition { kind } => {
                    let active = self
                        .state
                        .roster
                        .get(target)
                        .map(|c| c.conditions.is_active(*kind))
                        .unwrap_or(false);
                    if active {
                        self.set_condition(target, *kind, false, None, None, Default::default())
                    } else {
                        Ok(())
                    }
                }
                EffectSpec::Taunt { rounds } => self.taunt(target, source, *rounds),
                EffectSpec::Ward {
                    id,
                    capacity,
                    priority,
                    filter,
                } => {
                    if let Some(combatant) = self.present_mut(target) {
                        combatant.defenses.add_ward(Ward {
                            id: id.clone(),
                            remaining: capacity.resolve(level, rank),
                            priority: *priority,
                            filter: filter.clone(),
                        });
                    }
                    Ok(())
                }
                EffectSpec::Summon { kind, variant } => {
                    self.summon(source, kind, variant.as_deref()).map(|_| ())
                }
                EffectSpec::Charm { rounds } => self.apply_charm(source, target, *rounds),
            };

            if let Err(reason) = result {
                let effect: &'static str = effect.into();
                self.emit(CombatEvent::EffectFailed {
                    source,
                    target,
                    ability: ability.to_owned(),
                    effect,
                    reason,
                });
                failed.push(EffectFailure { effect, reason });
            }
        }
        (damage, failed)
    }

    fn present_mut(&mut self, id: CombatantId) -> Option<&mut crate::state::Combatant> {
        self.state.roster.get_mut(id).filter(|c| c.is_present())
    }

    /// Swings allowed this turn: one plus haste bonus actions.
    pub fn swings_for(&self, attacker: CombatantId) -> u32 {
        self.state
            .roster
            .get(attacker)
            .map(|c| 1 + bonus_actions(c.stats.haste_percent, &self.env.config.haste))
            .unwrap_or(0)
    }

    /// One melee swing. `swing` distinguishes swings within a turn for the
    /// hit roll.
    pub fn melee(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        swing: u32,
    ) -> RuleResult<MeleeOutcome> {
        let attacker_state = self.combatant(attacker)?;
        if !attacker_state.is_present() || !attacker_state.conditions.can_act() {
            return Err(FailureReason::CannotAct);
        }
        let target_state = self
            .state
            .roster
            .get(target)
            .filter(|c| c.is_present() && attacker_state.opposes(c))
            .ok_or(FailureReason::NoTarget)?;
        let (Some(from), Some(to)) = (attacker_state.position, target_state.position) else {
            return Err(FailureReason::NoTarget);
        };
        if distance(from, to) > self.env.config.ai.melee_range {
            return Err(FailureReason::OutOfRange);
        }

        let attack = attacker_state.stats.attack + attacker_state.effective_bonuses().attack;
        let armor = target_state.stats.armor + target_state.effective_bonuses().armor;
        let chance = calculate_hit_chance(attack, armor, &self.env.config.hit);
        let key = RollKey::new("hit")
            .packet(self.state.peek_packet_id())
            .combatant(Some(attacker))
            .combatant(Some(target))
            .clock(&self.state.clock)
            .u32(swing);
        if !self.env.roll.passes(&key, chance) {
            self.emit(CombatEvent::AttackMissed {
                attacker,
                target,
                chance,
            });
            return Ok(MeleeOutcome::Missed { chance });
        }

        let damage = i64::from(attacker_state.stats.damage)
            + i64::from(attacker_state.effective_bonuses().damage);
        let damage = u32::try_from(damage.max(0)).unwrap_or(u32::MAX);
        let outcome =
            self.apply_damage(DamageRequest::new(target).from(attacker).physical(damage), DamageOptions::default())?;
        Ok(MeleeOutcome::Hit(outcome))
    }

    /// Moves `actor` toward `target` until within `range`, within this
    /// turn's step budget.
    pub fn move_toward(
        &mut self,
        actor: CombatantId,
        target: Position,
        range: u32,
    ) -> RuleResult<MovePlan> {
        let actor_state = self.combatant(actor)?;
        if !actor_state.is_present() || !actor_state.conditions.can_move() {
            return Err(FailureReason::CannotMove);
        }
        let from = actor_state.position.ok_or(FailureReason::CannotMove)?;

        let anchor = actor_state
            .owner
            .and_then(|owner| self.state.roster.get(owner))
            .and_then(|owner| owner.position)
            .or(actor_state.home);
        let leash = actor_state
            .ai
            .leash_radius
            .zip(anchor)
            .map(|(radius, anchor)| Leash { anchor, radius });
        let limits = MoveLimits {
            max_steps: step_budget(
                self.env.config.ai.steps_per_turn,
                actor_state.conditions.move_multiplier_percent(),
            ),
            leash,
            hold_position: actor_state.ai.hold_while_engaged && self.is_engaged(actor),
        };

        let roster = &self.state.roster;
        let plan = plan_approach(from, target, range, limits, |cell| {
            roster.is_occupied(cell, Some(actor))
        })?;

        if let Some(to) = plan.destination() {
            self.combatant_mut(actor)?.position = Some(to);
            self.emit(CombatEvent::Moved { actor, from, to });
        }
        Ok(plan)
    }

    /// Raises an ability's rank by one.
    pub fn rank_up(&mut self, actor: CombatantId, ability: &str) -> RuleResult<u32> {
        let spec = self
            .env
            .catalog
            .ability(ability)
            .ok_or(FailureReason::CatalogNotFound)?;
        let max_rank = spec.max_rank.max(1);
        let combatant = self.combatant_mut(actor)?;
        let known = combatant
            .abilities
            .iter_mut()
            .find(|known| known.id == ability)
            .ok_or(FailureReason::PrereqNotMet)?;
        if known.rank >= max_rank {
            return Err(FailureReason::MaxRank);
        }
        known.rank += 1;
        let rank = known.rank;
        self.emit(CombatEvent::RankUp {
            actor,
            ability: ability.to_owned(),
            rank,
        });
        Ok(rank)
    }

    /// Threat-driven target for a hostile: the forced override when
    /// eligible, else the hysteresis-adjusted top of its table.
    pub fn select_threat_target(&mut self, hostile: CombatantId) -> Option<CombatantId> {
        let hysteresis = self.env.config.threat.hysteresis_percent;
        let eligible: Vec<CombatantId> = {
            let me = self.state.roster.get(hostile)?;
            self.state
                .roster
                .iter()
                .filter(|c| c.is_present() && me.opposes(c))
                .map(|c| c.id)
                .collect()
        };
        let table = self.state.roster.get_mut(hostile)?.threat.as_mut()?;
        table.select_target(hysteresis, |id| eligible.contains(&id))
    }

    /// Sets the target the actor is focused on. Assisting pets mirror it.
    pub fn set_target(&mut self, actor: CombatantId, target: Option<CombatantId>) -> RuleResult<()> {
        self.combatant_mut(actor)?.memory.target = target;
        Ok(())
    }

    /// Records a rotation use so reuse guards can see it.
    pub fn remember_use(
        &mut self,
        actor: CombatantId,
        ability: &str,
        target: CombatantId,
    ) -> RuleResult<()> {
        let clock = self.state.clock;
        self.combatant_mut(actor)?
            .memory
            .record_use(ability, target, &clock);
        Ok(())
    }
}
