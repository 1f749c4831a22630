//! Combat engine: named operations over [`CombatState`].
//!
//! The engine borrows the state mutably for the duration of one or more
//! operations and records [`CombatEvent`]s as it goes. Every operation either
//! succeeds or returns a [`FailureReason`] without having mutated anything.
//!
//! Operations are grouped by concern:
//! - [`damage`]: the damage pipeline commit, break rolls, threat accrual
//! - [`turns`]: encounter lifecycle and the turn-advance trigger
//! - [`summons`]: summon lifecycle, charm, pet management
//! - [`actions`]: casting, maintained effects, melee, movement

mod actions;
mod damage;
mod summons;
mod turns;

pub use actions::{CastOutcome, CastPlan, EffectFailure, MeleeOutcome};
pub use damage::{DamageOptions, DamageOutcome};
pub use turns::TurnReport;

use crate::catalog::CatalogOracle;
use crate::combat::DamageHooks;
use crate::config::CombatConfig;
use crate::error::{FailureReason, RuleResult};
use crate::events::CombatEvent;
use crate::movement::distance;
use crate::roll::RollOracle;
use crate::state::{CombatState, Combatant, CombatantId};

/// Read-only collaborators the engine consults.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub config: &'a CombatConfig,
    pub catalog: &'a dyn CatalogOracle,
    pub hooks: &'a DamageHooks,
    pub roll: &'a dyn RollOracle,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        config: &'a CombatConfig,
        catalog: &'a dyn CatalogOracle,
        hooks: &'a DamageHooks,
        roll: &'a dyn RollOracle,
    ) -> Self {
        Self {
            config,
            catalog,
            hooks,
            roll,
        }
    }
}

impl core::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("config", self.config)
            .field("hooks", self.hooks)
            .finish_non_exhaustive()
    }
}

/// Combat engine that owns the mutable borrow of the state.
pub struct CombatEngine<'a> {
    state: &'a mut CombatState,
    env: CombatEnv<'a>,
    events: Vec<CombatEvent>,
}

impl<'a> CombatEngine<'a> {
    pub fn new(state: &'a mut CombatState, env: CombatEnv<'a>) -> Self {
        Self {
            state,
            env,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &CombatState {
        self.state
    }

    pub fn env(&self) -> CombatEnv<'a> {
        self.env
    }

    pub fn config(&self) -> &'a CombatConfig {
        self.env.config
    }

    /// Drains the events recorded so far.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub(crate) fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn combatant(&self, id: CombatantId) -> RuleResult<&Combatant> {
        self.state.roster.get(id).ok_or(FailureReason::NotFound)
    }

    pub(crate) fn combatant_mut(&mut self, id: CombatantId) -> RuleResult<&mut Combatant> {
        self.state.roster.get_mut(id).ok_or(FailureReason::NotFound)
    }

    /// Present opposing combatants within melee range of `id`.
    pub fn is_engaged(&self, id: CombatantId) -> bool {
        let Some(actor) = self.state.roster.get(id) else {
            return false;
        };
        let Some(position) = actor.position else {
            return false;
        };
        let melee = self.env.config.ai.melee_range;
        self.state.roster.iter().any(|other| {
            other.is_present()
                && actor.opposes(other)
                && other
                    .position
                    .map(|p| distance(p, position) <= melee)
                    .unwrap_or(false)
        })
    }

    /// Removes `id` from every threat table.
    pub(crate) fn forget_threat_on(&mut self, id: CombatantId) {
        for combatant in self.state.roster.iter_mut() {
            if let Some(table) = combatant.threat.as_mut() {
                table.remove(id);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared setup for engine tests.

    use crate::catalog::{
        AbilitySpec, AbilityTag, Amount, EffectSpec, MemoryCatalog, SongSpec, SummonBase,
        SummonSpec, TargetKind,
    };
    use crate::combat::{DamageCategory, DamageHooks, DamageType};
    use crate::condition::ConditionKind;
    use crate::config::CombatConfig;
    use crate::cooldown::CooldownSpec;
    use crate::roll::Fnv1aRoll;
    use crate::state::{AiConfig, CombatStats, Role};
    use crate::summon::{BondBonus, BondTemplate, LevelScaling};

    pub struct Fixture {
        pub config: CombatConfig,
        pub catalog: MemoryCatalog,
        pub hooks: DamageHooks,
        pub roll: Fnv1aRoll,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                config: CombatConfig::default(),
                catalog: catalog(),
                hooks: DamageHooks::empty(),
                roll: Fnv1aRoll,
            }
        }

        pub fn env(&self) -> super::CombatEnv<'_> {
            super::CombatEnv::new(&self.config, &self.catalog, &self.hooks, &self.roll)
        }
    }

    pub fn catalog() -> MemoryCatalog {
        MemoryCatalog::default()
            .with_ability(AbilitySpec {
                id: "firebolt".into(),
                name: "Firebolt".into(),
                target: TargetKind::Enemy,
                range: 6,
                mana_cost: 10,
                cooldown: Some(CooldownSpec::Rounds(1)),
                group: Some("bolts".into()),
                tags: vec![AbilityTag::DirectDamage],
                max_rank: 3,
                effects: vec![EffectSpec::Damage {
                    kind: DamageType::Fire,
                    category: DamageCategory::Spell,
                    amount: Amount::flat(30),
                }],
                ..AbilitySpec::default()
            })
            .with_ability(AbilitySpec {
                id: "lullaby".into(),
                name: "Lullaby".into(),
                target: TargetKind::Enemy,
                range: 5,
                mana_cost: 5,
                tags: vec![AbilityTag::Debuff],
                max_rank: 1,
                effects: vec![EffectSpec::ApplyCondition {
                    kind: ConditionKind::Mesmerized,
                    rounds: Some(3),
                    meta: Default::default(),
                }],
                ..AbilitySpec::default()
            })
            .with_ability(AbilitySpec {
                id: "war-march".into(),
                name: "War March".into(),
                target: TargetKind::Caster,
                max_rank: 1,
                ..AbilitySpec::default()
            })
            .with_ability(AbilitySpec {
                id: "call-wolf".into(),
                name: "Call Wolf".into(),
                target: TargetKind::Caster,
                mana_cost: 8,
                max_rank: 1,
                effects: vec![EffectSpec::Summon {
                    kind: "wolf".into(),
                    variant: None,
                }],
                ..AbilitySpec::default()
            })
            .with_song(
                "war-march",
                SongSpec {
                    group: "march".into(),
                    duration_rounds: 4,
                    pulse_interval: 1,
                    priority: 1,
                    effects: vec![EffectSpec::Heal {
                        amount: Amount::flat(5),
                    }],
                },
            )
            .with_summon(SummonSpec {
                kind: "wolf".into(),
                name: "Spirit Wolf".into(),
                base: SummonBase {
                    max_hp: 200,
                    max_mana: 0,
                    stats: CombatStats {
                        attack: 5,
                        damage: 12,
                        ..CombatStats::default()
                    },
                    role: Role::Damage,
                },
                bond: BondTemplate {
                    hp: LevelScaling::new(10, 200),
                    ..BondTemplate::default()
                },
                flat: BondBonus {
                    hp: 15,
                    ..BondBonus::default()
                },
                default_rounds: Some(10),
                ai: AiConfig::default(),
                bundle: Some("wolf-kit".into()),
                variants: [(
                    "dire".to_string(),
                    crate::catalog::SummonVariant {
                        name: "Dire Wolf".into(),
                        base: SummonBase {
                            max_hp: 300,
                            role: Role::Tank,
                            ..SummonBase::default()
                        },
                        bundle: None,
                    },
                )]
                .into_iter()
                .collect(),
            })
            .with_bundle("wolf-kit", vec!["firebolt".into()])
    }
}
