//! Decision engine for pets, charmed combatants and hostile NPCs.
//!
//! The engine runs once per affected combatant when a turn advances. Every
//! step (move, cast, swing) goes through [`CombatEngine`] and is finished
//! before the next one starts; casts additionally await the
//! [`ConfirmationProvider`] between validation and commit.

mod hostile;
mod pet;
pub mod rotation;

use serde::Serialize;
use tracing::debug;

use combat_core::{
    CatalogOracle, CombatConfig, CombatEngine, CombatEnv, CombatEvent, CombatState, CombatantId,
    Position, distance,
};

use crate::api::ConfirmationProvider;

pub use rotation::{Candidate, RotationProfile, Tier};

/// What the decision engine did for one combatant on one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnDecision {
    pub actor: CombatantId,
    pub target: Option<CombatantId>,
    pub taunted: bool,
    pub cast: Option<String>,
    /// A cast was declined at the confirmation point.
    pub cancelled: bool,
    pub moved: bool,
    pub swings: u32,
    pub hits: u32,
    pub skipped: Option<&'static str>,
}

impl TurnDecision {
    fn new(actor: CombatantId) -> Self {
        Self {
            actor,
            ..Self::default()
        }
    }

    fn skip(mut self, reason: &'static str) -> Self {
        self.skipped = Some(reason);
        self
    }

    pub fn acted(&self) -> bool {
        self.taunted || self.cast.is_some() || self.moved || self.swings > 0
    }
}

/// Everything one turn of decisions needs: the authoritative state, the
/// read-only collaborators, and the confirmation point.
pub struct TurnContext<'a> {
    state: &'a mut CombatState,
    env: CombatEnv<'a>,
    confirm: &'a dyn ConfirmationProvider,
    events: Vec<CombatEvent>,
}

impl<'a> TurnContext<'a> {
    pub fn new(
        state: &'a mut CombatState,
        env: CombatEnv<'a>,
        confirm: &'a dyn ConfirmationProvider,
    ) -> Self {
        Self {
            state,
            env,
            confirm,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &CombatState {
        self.state
    }

    pub fn config(&self) -> &'a CombatConfig {
        self.env.config
    }

    pub fn catalog(&self) -> &'a dyn CatalogOracle {
        self.env.catalog
    }

    /// Runs one engine operation and keeps the events it recorded.
    pub fn engine<R>(&mut self, f: impl FnOnce(&mut CombatEngine<'_>) -> R) -> R {
        let mut engine = CombatEngine::new(&mut *self.state, self.env);
        let result = f(&mut engine);
        self.events.extend(engine.take_events());
        result
    }

    pub fn into_events(self) -> Vec<CombatEvent> {
        self.events
    }
}

enum Driver {
    Hostile,
    /// Summons and charmed combatants, driven on their owner's behalf.
    Pet,
}

/// Decides and performs one combatant's turn.
pub async fn take_turn(ctx: &mut TurnContext<'_>, actor: CombatantId) -> TurnDecision {
    let driver = match ctx.state().roster.get(actor) {
        None => Err("unknown"),
        Some(me) if !me.is_present() => Err("absent"),
        Some(me) if me.is_hostile() && !me.ai.enabled => Err("disabled"),
        Some(me) if me.is_hostile() => Ok(Driver::Hostile),
        Some(me) if me.owner.is_some() => Ok(Driver::Pet),
        Some(_) => Err("not-driven"),
    };
    let decision = match driver {
        Ok(Driver::Hostile) => hostile::take_turn(ctx, actor),
        Ok(Driver::Pet) => pet::take_turn(ctx, actor).await,
        Err(reason) => TurnDecision::new(actor).skip(reason),
    };

    debug!(
        target: "runtime::ai",
        %actor,
        target = ?decision.target,
        cast = ?decision.cast,
        swings = decision.swings,
        hits = decision.hits,
        skipped = ?decision.skipped,
        "turn decided"
    );
    decision
}

/// Nearest present opponent of `actor` within `radius` of `from`. Ties go to
/// the lower id.
fn nearest_opponent(
    state: &CombatState,
    actor: CombatantId,
    from: Position,
    radius: u32,
) -> Option<CombatantId> {
    let me = state.roster.get(actor)?;
    state
        .roster
        .iter()
        .filter(|other| other.is_present() && me.opposes(other))
        .filter_map(|other| other.position.map(|p| (distance(from, p), other.id)))
        .filter(|(d, _)| *d <= radius)
        .min()
        .map(|(_, id)| id)
}

/// Present opponent check used to keep or drop a remembered target.
fn is_valid_target(state: &CombatState, actor: CombatantId, target: CombatantId) -> bool {
    match (state.roster.get(actor), state.roster.get(target)) {
        (Some(me), Some(other)) => other.is_present() && me.opposes(other),
        _ => false,
    }
}

/// Closes to melee range, then swings up to `max_swings` times. Stops at the
/// first refusal.
fn strike(
    ctx: &mut TurnContext<'_>,
    attacker: CombatantId,
    target: CombatantId,
    max_swings: u32,
    decision: &mut TurnDecision,
) {
    let melee_range = ctx.config().ai.melee_range;
    let positions = (
        ctx.state().roster.get(attacker).and_then(|c| c.position),
        ctx.state().roster.get(target).and_then(|c| c.position),
    );
    let (Some(from), Some(to)) = positions else {
        return;
    };

    if distance(from, to) > melee_range {
        match ctx.engine(|e| e.move_toward(attacker, to, melee_range)) {
            Ok(plan) => decision.moved |= plan.destination().is_some(),
            Err(reason) => {
                debug!(target: "runtime::ai", actor = %attacker, reason = reason.code(), "approach refused");
                return;
            }
        }
    }

    for swing in 0..max_swings {
        match ctx.engine(|e| e.melee(attacker, target, swing)) {
            Ok(outcome) => {
                decision.swings += 1;
                if outcome.is_hit() {
                    decision.hits += 1;
                }
            }
            Err(reason) => {
                debug!(target: "runtime::ai", actor = %attacker, reason = reason.code(), "swing refused");
                break;
            }
        }
    }
}
