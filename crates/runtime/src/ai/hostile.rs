//! Hostile NPC turns: threat-driven target, approach, one attack.

use super::{TurnContext, TurnDecision, nearest_opponent, strike};
use combat_core::CombatantId;
use tracing::debug;

pub(super) fn take_turn(ctx: &mut TurnContext<'_>, actor: CombatantId) -> TurnDecision {
    let decision = TurnDecision::new(actor);
    let Some(me) = ctx.state().roster.get(actor) else {
        return decision.skip("unknown");
    };
    if !me.conditions.can_act() {
        return decision.skip("cannot-act");
    }
    let radius = me.ai.aggression_radius;
    let position = me.position;

    // An empty threat table falls back to proximity.
    let target = ctx.engine(|e| e.select_threat_target(actor)).or_else(|| {
        position.and_then(|from| nearest_opponent(ctx.state(), actor, from, radius))
    });
    if let Err(reason) = ctx.engine(|e| e.set_target(actor, target)) {
        debug!(target: "runtime::ai", %actor, reason = reason.code(), "target not recorded");
    }

    let mut decision = TurnDecision { target, ..decision };
    let Some(target) = target else {
        return decision.skip("no-target");
    };
    strike(ctx, actor, target, 1, &mut decision);
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AutoConfirm;
    use combat_core::{
        Allegiance, CombatConfig, CombatEnv, CombatState, CombatStats, Combatant, DamageHooks,
        EncounterId, Fnv1aRoll, MemoryCatalog, Position, ThreatTable,
    };

    fn hostile() -> Combatant {
        let mut orc = Combatant::new("orc", Allegiance::Hostile, 100, 0)
            .at(Position::new(5, 0))
            .with_stats(CombatStats {
                attack: 200,
                damage: 5,
                ..CombatStats::default()
            });
        orc.threat = Some(ThreatTable::new());
        orc
    }

    #[test]
    fn approaches_top_threat_and_swings_once() {
        let config = CombatConfig::default();
        let catalog = MemoryCatalog::default();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut state = CombatState::new();
        let near = state.spawn(Combatant::new("near", Allegiance::Player, 100, 0).at(Position::new(5, 3)));
        let far = state.spawn(Combatant::new("far", Allegiance::Player, 100, 0).at(Position::new(0, 0)));
        let orc = state.spawn(hostile());
        state.clock = combat_core::CombatClock::in_encounter(EncounterId(1), 1, 0);
        if let Some(table) = state.roster.get_mut(orc).and_then(|c| c.threat.as_mut()) {
            table.add_threat(far, 50, 0);
            table.add_threat(near, 10, 0);
        }

        let mut ctx = TurnContext::new(&mut state, env, &AutoConfirm);
        let decision = take_turn(&mut ctx, orc);
        assert_eq!(decision.target, Some(far));
        assert!(decision.moved);
        assert!(decision.swings <= 1);
        drop(ctx);
        assert_eq!(state.roster.get(orc).and_then(|c| c.memory.target), Some(far));
    }

    #[test]
    fn empty_table_falls_back_to_nearest() {
        let config = CombatConfig::default();
        let catalog = MemoryCatalog::default();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut state = CombatState::new();
        let _far = state.spawn(Combatant::new("far", Allegiance::Player, 100, 0).at(Position::new(0, 0)));
        let near = state.spawn(Combatant::new("near", Allegiance::Player, 100, 0).at(Position::new(4, 0)));
        let orc = state.spawn(hostile());

        let mut ctx = TurnContext::new(&mut state, env, &AutoConfirm);
        let decision = take_turn(&mut ctx, orc);
        assert_eq!(decision.target, Some(near));
        assert_eq!(decision.swings, 1);
        assert!(!decision.moved);
    }
}
