//! Allied pet turns: target resolution, auto-taunt, cast rotation, melee.

use tracing::debug;

use combat_core::{AiConfig, AiMode, CombatState, CombatantId, FailureReason, Role, distance};

use super::rotation::{self, Candidate, Tier};
use super::{TurnContext, TurnDecision, is_valid_target, nearest_opponent, strike};
use crate::api::{Confirmation, PendingStep};

pub(super) async fn take_turn(ctx: &mut TurnContext<'_>, actor: CombatantId) -> TurnDecision {
    let decision = TurnDecision::new(actor);
    let Some(me) = ctx.state().roster.get(actor) else {
        return decision.skip("unknown");
    };
    if !me.ai.is_driving() {
        return decision.skip("passive");
    }
    if !me.conditions.can_act() {
        return decision.skip("cannot-act");
    }
    let ai = me.ai.clone();
    let owner = me.owner;
    let role = me.role;
    let can_cast = me.conditions.can_cast();

    let target = resolve_target(ctx.state(), actor, owner, &ai);
    if let Err(reason) = ctx.engine(|e| e.set_target(actor, target)) {
        debug!(target: "runtime::ai", %actor, reason = reason.code(), "target not recorded");
    }
    let mut decision = TurnDecision { target, ..decision };

    let Some(target) = target else {
        if ai.prefers_casting && can_cast {
            run_rotation(ctx, actor, None, true, &mut decision).await;
        }
        if decision.cast.is_none() && !decision.cancelled {
            follow_owner(ctx, actor, owner, ai.follow_distance, &mut decision);
        }
        return decision;
    };

    if role == Role::Tank && ai.auto_taunt {
        maybe_taunt(ctx, actor, target, &mut decision);
    }

    let engaged = ctx.engine(|e| e.is_engaged(actor));
    if ai.prefers_casting && can_cast && (!engaged || ai.cast_while_engaged) {
        if run_rotation(ctx, actor, Some(target), false, &mut decision).await {
            return decision;
        }
        if decision.cancelled {
            return decision;
        }
    }

    let swings = ctx.engine(|e| e.swings_for(actor));
    strike(ctx, actor, target, swings, &mut decision);
    decision
}

/// Target by behavior mode, falling back to the remembered target while it
/// stays valid.
fn resolve_target(
    state: &CombatState,
    actor: CombatantId,
    owner: Option<CombatantId>,
    ai: &AiConfig,
) -> Option<CombatantId> {
    let me = state.roster.get(actor)?;
    let owner_state = owner.and_then(|id| state.roster.get(id));

    let picked = match ai.mode {
        AiMode::Passive => None,
        AiMode::Assist => owner_state
            .and_then(|owner| owner.memory.target)
            .filter(|target| is_valid_target(state, actor, *target)),
        AiMode::Guard => owner_state
            .and_then(|owner| owner.position)
            .or(me.position)
            .and_then(|from| nearest_opponent(state, actor, from, ai.aggression_radius)),
        AiMode::Autonomous => me
            .position
            .and_then(|from| nearest_opponent(state, actor, from, ai.aggression_radius)),
    };

    picked.or_else(|| {
        me.memory
            .target
            .filter(|target| is_valid_target(state, actor, *target))
    })
}

/// Taunts `target` once per round unless this pet already holds its
/// attention.
fn maybe_taunt(
    ctx: &mut TurnContext<'_>,
    actor: CombatantId,
    target: CombatantId,
    decision: &mut TurnDecision,
) {
    let state = ctx.state();
    let Some(me) = state.roster.get(actor) else {
        return;
    };
    if me.memory.taunted_this_round(&state.clock) {
        return;
    }
    let Some(table) = state.roster.get(target).and_then(|c| c.threat.as_ref()) else {
        return;
    };
    let forced_on_me = table.forced().map(|f| f.target == actor).unwrap_or(false);
    let on_top = table
        .top(|id| {
            state
                .roster
                .get(id)
                .map(|c| c.is_present())
                .unwrap_or(false)
        })
        .map(|(id, _)| id == actor)
        .unwrap_or(false);
    if forced_on_me || on_top {
        return;
    }

    let rounds = ctx.config().threat.taunt_rounds;
    match ctx.engine(|e| e.taunt(target, actor, rounds)) {
        Ok(()) => decision.taunted = true,
        Err(reason) => {
            debug!(target: "runtime::ai", %actor, %target, reason = reason.code(), "taunt refused");
        }
    }
}

/// Walks back toward the owner when farther than the follow distance.
fn follow_owner(
    ctx: &mut TurnContext<'_>,
    actor: CombatantId,
    owner: Option<CombatantId>,
    follow_distance: u32,
    decision: &mut TurnDecision,
) {
    let state = ctx.state();
    let from = state.roster.get(actor).and_then(|c| c.position);
    let to = owner
        .and_then(|id| state.roster.get(id))
        .filter(|c| c.is_present())
        .and_then(|c| c.position);
    let (Some(from), Some(to)) = (from, to) else {
        return;
    };
    if distance(from, to) <= follow_distance {
        return;
    }
    match ctx.engine(|e| e.move_toward(actor, to, follow_distance)) {
        Ok(plan) => decision.moved |= plan.destination().is_some(),
        Err(reason) => {
            debug!(target: "runtime::ai", %actor, reason = reason.code(), "follow refused");
        }
    }
}

/// Tries rotation candidates in order. Returns true once a cast commits.
///
/// A declined confirmation stops the rotation and marks the decision
/// cancelled; nothing is committed for that step.
async fn run_rotation(
    ctx: &mut TurnContext<'_>,
    actor: CombatantId,
    target: Option<CombatantId>,
    heal_only: bool,
    decision: &mut TurnDecision,
) -> bool {
    let tuning = ctx.config().ai;
    let candidates = rotation::candidates(ctx.state(), ctx.catalog(), actor, target, &tuning);

    for candidate in candidates {
        if heal_only && candidate.tier != Tier::Heal {
            continue;
        }
        let validated = ctx.engine(|e| {
            e.validate_cast(actor, &candidate.ability, Some(candidate.target))
        });
        let plan = match validated {
            Ok(plan) => plan,
            Err(FailureReason::OutOfRange) => match step_into_range(ctx, actor, &candidate, decision) {
                Some(plan) => plan,
                None => continue,
            },
            Err(reason) => {
                debug!(
                    target: "runtime::ai",
                    %actor,
                    ability = %candidate.ability,
                    reason = reason.code(),
                    "candidate refused"
                );
                continue;
            }
        };

        let step = PendingStep {
            actor,
            ability: plan.ability.clone(),
            target: plan.target,
        };
        let confirm = ctx.confirm;
        if confirm.confirm(&step).await == Confirmation::Cancel {
            debug!(target: "runtime::ai", %actor, ability = %step.ability, "cast cancelled");
            decision.cancelled = true;
            return false;
        }

        match ctx.engine(|e| e.commit_cast(&plan)) {
            Ok(_) => {
                if let Err(reason) =
                    ctx.engine(|e| e.remember_use(actor, &plan.ability, plan.target))
                {
                    debug!(target: "runtime::ai", %actor, reason = reason.code(), "use not recorded");
                }
                decision.cast = Some(plan.ability);
                return true;
            }
            Err(reason) => {
                debug!(
                    target: "runtime::ai",
                    %actor,
                    ability = %plan.ability,
                    reason = reason.code(),
                    "commit refused"
                );
            }
        }
    }
    false
}

/// Moves toward the candidate's target until within the ability's range,
/// then validates again. Only one approach is made per turn.
fn step_into_range(
    ctx: &mut TurnContext<'_>,
    actor: CombatantId,
    candidate: &Candidate,
    decision: &mut TurnDecision,
) -> Option<combat_core::CastPlan> {
    if decision.moved {
        return None;
    }
    let range = ctx.catalog().ability(&candidate.ability)?.range;
    let to = ctx.state().roster.get(candidate.target)?.position?;
    match ctx.engine(|e| e.move_toward(actor, to, range)) {
        Ok(plan) => decision.moved |= plan.destination().is_some(),
        Err(reason) => {
            debug!(
                target: "runtime::ai",
                %actor,
                ability = %candidate.ability,
                reason = reason.code(),
                "cannot close to cast range"
            );
            return None;
        }
    }
    ctx.engine(|e| e.validate_cast(actor, &candidate.ability, Some(candidate.target)))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AutoConfirm, ConfirmationProvider};
    use async_trait::async_trait;
    use combat_core::{
        AbilitySpec, AbilityTag, Allegiance, Amount, CombatClock, CombatConfig, CombatEnv,
        CombatStats, Combatant, DamageCategory, DamageHooks, DamageType, EffectSpec, EncounterId, Fnv1aRoll,
        MemoryCatalog, Position, TargetKind, ThreatTable,
    };

    struct Decline;

    #[async_trait]
    impl ConfirmationProvider for Decline {
        async fn confirm(&self, _step: &PendingStep) -> Confirmation {
            Confirmation::Cancel
        }
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::default().with_ability(AbilitySpec {
            id: "firebolt".into(),
            target: TargetKind::Enemy,
            range: 6,
            mana_cost: 10,
            tags: vec![AbilityTag::DirectDamage],
            max_rank: 1,
            effects: vec![EffectSpec::Damage {
                kind: DamageType::Fire,
                category: DamageCategory::Spell,
                amount: Amount::flat(10),
            }],
            ..AbilitySpec::default()
        })
    }

    struct Scene {
        state: CombatState,
        owner: CombatantId,
        pet: CombatantId,
        foe: CombatantId,
    }

    fn scene(ai: AiConfig) -> Scene {
        let mut state = CombatState::new();
        let owner = state.spawn(Combatant::new("owner", Allegiance::Player, 100, 0).at(Position::new(0, 0)));
        let pet = state.spawn(
            Combatant::new("sprite", Allegiance::Player, 80, 100)
                .at(Position::new(1, 0))
                .with_owner(owner)
                .with_ai(ai)
                .with_stats(CombatStats {
                    attack: 200,
                    damage: 4,
                    ..CombatStats::default()
                })
                .with_ability("firebolt"),
        );
        let mut foe = Combatant::new("foe", Allegiance::Hostile, 200, 0).at(Position::new(4, 0));
        foe.threat = Some(ThreatTable::new());
        let foe = state.spawn(foe);
        state.clock = CombatClock::in_encounter(EncounterId(1), 1, 0);
        Scene {
            state,
            owner,
            pet,
            foe,
        }
    }

    #[tokio::test]
    async fn assist_mirrors_owner_and_casts() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut s = scene(AiConfig {
            prefers_casting: true,
            ..AiConfig::default()
        });
        if let Some(owner) = s.state.roster.get_mut(s.owner) {
            owner.memory.target = Some(s.foe);
        }

        let mut ctx = TurnContext::new(&mut s.state, env, &AutoConfirm);
        let decision = take_turn(&mut ctx, s.pet).await;
        assert_eq!(decision.target, Some(s.foe));
        assert_eq!(decision.cast.as_deref(), Some("firebolt"));
        assert_eq!(decision.swings, 0);
        drop(ctx);

        let pet = s.state.roster.get(s.pet).unwrap();
        assert_eq!(pet.resources.mana.current, 90);
        assert!(pet.memory.recently_used("firebolt", s.foe, 1, &s.state.clock));
    }

    #[tokio::test]
    async fn cancelled_cast_commits_nothing() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut s = scene(AiConfig {
            mode: AiMode::Autonomous,
            prefers_casting: true,
            ..AiConfig::default()
        });

        let mut ctx = TurnContext::new(&mut s.state, env, &Decline);
        let decision = take_turn(&mut ctx, s.pet).await;
        assert!(decision.cancelled);
        assert_eq!(decision.cast, None);
        assert_eq!(decision.swings, 0);
        drop(ctx);

        let pet = s.state.roster.get(s.pet).unwrap();
        assert_eq!(pet.resources.mana.current, 100);
        assert_eq!(s.state.roster.get(s.foe).unwrap().resources.hp.current, 200);
    }

    #[tokio::test]
    async fn melee_pet_closes_and_swings() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut s = scene(AiConfig {
            mode: AiMode::Guard,
            ..AiConfig::default()
        });

        let mut ctx = TurnContext::new(&mut s.state, env, &AutoConfirm);
        let decision = take_turn(&mut ctx, s.pet).await;
        assert_eq!(decision.target, Some(s.foe));
        assert!(decision.moved);
        assert_eq!(decision.cast, None);
        assert_eq!(decision.swings, 1);
    }

    #[tokio::test]
    async fn passive_pet_does_nothing() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut s = scene(AiConfig {
            mode: AiMode::Passive,
            ..AiConfig::default()
        });

        let mut ctx = TurnContext::new(&mut s.state, env, &AutoConfirm);
        let decision = take_turn(&mut ctx, s.pet).await;
        assert_eq!(decision.skipped, Some("passive"));
        assert!(!decision.acted());
        assert!(ctx.into_events().is_empty());
    }

    #[tokio::test]
    async fn idle_pet_follows_owner() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut s = scene(AiConfig::default());
        if let Some(pet) = s.state.roster.get_mut(s.pet) {
            pet.position = Some(Position::new(-6, 0));
        }

        let mut ctx = TurnContext::new(&mut s.state, env, &AutoConfirm);
        let decision = take_turn(&mut ctx, s.pet).await;
        assert_eq!(decision.target, None);
        assert!(decision.moved);
        drop(ctx);
        let at = s.state.roster.get(s.pet).and_then(|c| c.position).unwrap();
        assert!(distance(at, Position::new(0, 0)) <= 2);
    }

    #[tokio::test]
    async fn tank_taunts_once_per_round() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut s = scene(AiConfig {
            mode: AiMode::Autonomous,
            ..AiConfig::default()
        });
        if let Some(pet) = s.state.roster.get_mut(s.pet) {
            pet.role = Role::Tank;
        }
        if let Some(table) = s.state.roster.get_mut(s.foe).and_then(|c| c.threat.as_mut()) {
            table.add_threat(s.owner, 100, 0);
        }

        let mut ctx = TurnContext::new(&mut s.state, env, &AutoConfirm);
        let first = take_turn(&mut ctx, s.pet).await;
        let second = take_turn(&mut ctx, s.pet).await;
        assert!(first.taunted);
        assert!(!second.taunted);
        drop(ctx);
        let forced = s
            .state
            .roster
            .get(s.foe)
            .and_then(|c| c.threat.as_ref())
            .and_then(|t| t.forced().map(|f| f.target));
        assert_eq!(forced, Some(s.pet));
    }
}
