//! Simulation worker that owns the authoritative [`CombatState`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), executes
//! them through [`CombatEngine`], drives the decision engine on turn advances,
//! and publishes every resulting event to the [`EventBus`] and the rolling
//! [`EventLog`]. Commands are processed one at a time in arrival order.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use combat_core::{
    CastOutcome, CatalogOracle, CombatConfig, CombatEngine, CombatEnv, CombatEvent, CombatState,
    Combatant, CombatantId, ConditionSnapshot, DamageHooks, DamageOptions, DamageOutcome,
    DamageRequest, EncounterId, FailureReason, MeleeOutcome, RollOracle, RuleResult,
    ThreatSnapshot, TurnReport, condition_snapshot, threat_snapshot,
};

use crate::ai::{self, TurnContext, TurnDecision};
use crate::api::ConfirmationProvider;
use crate::authority::{AuthorityExecutor, RequestEnvelope};
use crate::events::{Event, EventBus, EventLog, LogEntry, Notice, SkipReason, TurnEvent};
use crate::hooks::report_fault;

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Adds a combatant to the roster as-is.
    Spawn {
        combatant: Box<Combatant>,
        reply: oneshot::Sender<CombatantId>,
    },
    Summon {
        owner: CombatantId,
        kind: String,
        variant: Option<String>,
        reply: oneshot::Sender<RuleResult<CombatantId>>,
    },
    BeginEncounter {
        encounter: EncounterId,
        reply: oneshot::Sender<()>,
    },
    EndEncounter {
        reply: oneshot::Sender<RuleResult<()>>,
    },
    /// Turn-advance trigger. `active` overrides the default turn order.
    AdvanceTurn {
        round: u32,
        turn: u32,
        active: Option<CombatantId>,
        reply: oneshot::Sender<RuleResult<TurnOutcome>>,
    },
    /// A directly controlled cast. No confirmation step.
    Cast {
        caster: CombatantId,
        ability: String,
        target: Option<CombatantId>,
        reply: oneshot::Sender<RuleResult<CastOutcome>>,
    },
    /// A directly controlled melee attack with every haste swing.
    Attack {
        attacker: CombatantId,
        target: CombatantId,
        reply: oneshot::Sender<RuleResult<Vec<MeleeOutcome>>>,
    },
    ApplyDamage {
        request: DamageRequest,
        options: DamageOptions,
        reply: oneshot::Sender<RuleResult<DamageOutcome>>,
    },
    /// A request from a non-authoritative participant.
    Submit {
        envelope: RequestEnvelope,
        reply: oneshot::Sender<Notice>,
    },
    ThreatSnapshot {
        hostile: CombatantId,
        top: usize,
        reply: oneshot::Sender<Option<ThreatSnapshot>>,
    },
    ConditionSnapshot {
        combatant: CombatantId,
        reply: oneshot::Sender<Option<ConditionSnapshot>>,
    },
    RecentEvents {
        limit: usize,
        reply: oneshot::Sender<Vec<LogEntry>>,
    },
    /// Query the current combat state (read-only).
    QueryState { reply: oneshot::Sender<CombatState> },
}

/// Result of one turn-advance trigger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnOutcome {
    /// Set when the trigger was ignored by the re-entrancy gate.
    pub skipped: Option<SkipReason>,
    pub report: Option<TurnReport>,
    pub decisions: Vec<TurnDecision>,
}

/// Authoritative state plus the read-only collaborators every engine
/// operation borrows.
pub struct World {
    pub state: CombatState,
    pub config: CombatConfig,
    pub catalog: Arc<dyn CatalogOracle>,
    pub hooks: DamageHooks,
    pub roll: Arc<dyn RollOracle>,
}

impl World {
    /// Runs one engine operation, returning its result and recorded events.
    fn run<R>(&mut self, f: impl FnOnce(&mut CombatEngine<'_>) -> R) -> (R, Vec<CombatEvent>) {
        let env = CombatEnv::new(
            &self.config,
            self.catalog.as_ref(),
            &self.hooks,
            self.roll.as_ref(),
        );
        let mut engine = CombatEngine::new(&mut self.state, env);
        let result = f(&mut engine);
        let events = engine.take_events();
        (result, events)
    }
}

/// Drops repeated or too-frequent turn triggers.
#[derive(Debug)]
struct TurnGate {
    last: Option<(EncounterId, u32, u32)>,
    last_at: Option<Instant>,
    min_interval: Duration,
}

impl TurnGate {
    fn new(min_interval: Duration) -> Self {
        Self {
            last: None,
            last_at: None,
            min_interval,
        }
    }

    fn admit(&mut self, triple: (EncounterId, u32, u32), now: Instant) -> Result<(), SkipReason> {
        if self.last == Some(triple) {
            return Err(SkipReason::Duplicate);
        }
        if let Some(at) = self.last_at {
            if now.saturating_duration_since(at) < self.min_interval {
                return Err(SkipReason::TooSoon);
            }
        }
        self.last = Some(triple);
        self.last_at = Some(now);
        Ok(())
    }
}

/// Background task that processes combat commands.
pub struct SimulationWorker {
    world: World,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    log: EventLog,
    gate: TurnGate,
    confirm: Arc<dyn ConfirmationProvider>,
    authority: AuthorityExecutor,
}

impl SimulationWorker {
    pub fn new(
        world: World,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        log: EventLog,
        min_turn_interval: Duration,
        confirm: Arc<dyn ConfirmationProvider>,
        authority: AuthorityExecutor,
    ) -> Self {
        info!(
            target: "runtime::worker",
            combatants = world.state.roster.len(),
            min_turn_interval_ms = min_turn_interval.as_millis() as u64,
            "simulation worker initialized"
        );
        Self {
            world,
            command_rx,
            event_bus,
            log,
            gate: TurnGate::new(min_turn_interval),
            confirm,
            authority,
        }
    }

    /// Main worker loop. Ends once every command sender is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }
        debug!(target: "runtime::worker", "command channel closed, worker exiting");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Spawn { combatant, reply } => {
                let id = self.world.state.spawn(*combatant);
                let _ = reply.send(id);
            }
            Command::Summon {
                owner,
                kind,
                variant,
                reply,
            } => {
                let (result, events) = self
                    .world
                    .run(|e| e.summon(owner, &kind, variant.as_deref()));
                self.publish_combat(events);
                let _ = reply.send(refused("summon", result));
            }
            Command::BeginEncounter { encounter, reply } => {
                let now = now_ms();
                let ((), events) = self.world.run(|e| e.begin_encounter(encounter, now));
                self.publish_combat(events);
                let _ = reply.send(());
            }
            Command::EndEncounter { reply } => {
                let now = now_ms();
                let (result, events) = self.world.run(|e| e.end_encounter(now));
                self.publish_combat(events);
                let _ = reply.send(refused("end-encounter", result));
            }
            Command::AdvanceTurn {
                round,
                turn,
                active,
                reply,
            } => {
                let result = self.advance_turn(round, turn, active).await;
                let _ = reply.send(result);
            }
            Command::Cast {
                caster,
                ability,
                target,
                reply,
            } => {
                let (result, events) = self.world.run(|e| -> RuleResult<CastOutcome> {
                    let outcome = e.cast(caster, &ability, target)?;
                    focus(e, caster, target);
                    Ok(outcome)
                });
                self.publish_combat(events);
                let _ = reply.send(refused("cast", result));
            }
            Command::Attack {
                attacker,
                target,
                reply,
            } => {
                let (result, events) = self.world.run(|e| attack(e, attacker, target));
                self.publish_combat(events);
                let _ = reply.send(refused("attack", result));
            }
            Command::ApplyDamage {
                request,
                options,
                reply,
            } => {
                let (result, events) = self.world.run(|e| e.apply_damage(request, options));
                self.publish_combat(events);
                let _ = reply.send(refused("apply-damage", result));
            }
            Command::Submit { envelope, reply } => {
                let authority = &self.authority;
                let (notice, events) = self.world.run(|e| authority.execute(e, &envelope));
                self.publish_combat(events);
                self.publish(Event::Notice(notice.clone()));
                let _ = reply.send(notice);
            }
            Command::ThreatSnapshot {
                hostile,
                top,
                reply,
            } => {
                let _ = reply.send(threat_snapshot(&self.world.state, hostile, top));
            }
            Command::ConditionSnapshot { combatant, reply } => {
                let snapshot =
                    condition_snapshot(&self.world.state, combatant, &self.world.config);
                let _ = reply.send(snapshot);
            }
            Command::RecentEvents { limit, reply } => {
                let _ = reply.send(self.log.recent(limit));
            }
            Command::QueryState { reply } => {
                let _ = reply.send(self.world.state.clone());
            }
        }
    }

    async fn advance_turn(
        &mut self,
        round: u32,
        turn: u32,
        active: Option<CombatantId>,
    ) -> RuleResult<TurnOutcome> {
        let encounter = self
            .world
            .state
            .clock
            .encounter
            .ok_or(FailureReason::PrereqNotMet)?;

        if let Err(reason) = self.gate.admit((encounter, round, turn), Instant::now()) {
            debug!(
                target: "runtime::worker",
                ?encounter,
                round,
                turn,
                ?reason,
                "turn trigger ignored"
            );
            self.publish(Event::Turn(TurnEvent::Skipped {
                encounter,
                round,
                turn,
                reason,
            }));
            return Ok(TurnOutcome {
                skipped: Some(reason),
                ..TurnOutcome::default()
            });
        }

        let now = now_ms();
        let (report, events) = self.world.run(|e| e.advance_turn(round, turn, now));
        self.publish_combat(events);
        let report = report?;

        let driven = affected(&self.world.state, turn, active);
        let mut decisions = Vec::with_capacity(driven.len());
        for actor in driven.iter().copied() {
            let World {
                state,
                config,
                catalog,
                hooks,
                roll,
            } = &mut self.world;
            let env = CombatEnv::new(&*config, catalog.as_ref(), &*hooks, roll.as_ref());
            let mut ctx = TurnContext::new(state, env, self.confirm.as_ref());
            let decision = ai::take_turn(&mut ctx, actor).await;
            let events = ctx.into_events();

            self.publish_combat(events);
            self.publish(Event::Turn(TurnEvent::Decided(decision.clone())));
            decisions.push(decision);
        }

        self.publish(Event::Turn(TurnEvent::Advanced {
            encounter,
            round,
            turn,
            driven,
            report: report.clone(),
        }));
        Ok(TurnOutcome {
            skipped: None,
            report: Some(report),
            decisions,
        })
    }

    fn publish_combat(&mut self, events: Vec<CombatEvent>) {
        for event in events {
            match &event {
                CombatEvent::PhaseFaulted { packet, fault } => report_fault(*packet, fault),
                CombatEvent::EffectFailed {
                    source,
                    ability,
                    effect,
                    reason,
                    ..
                } => debug!(
                    target: "runtime::worker",
                    %source,
                    ability = %ability,
                    effect,
                    reason = reason.code(),
                    "effect refused"
                ),
                _ => {}
            }
            self.publish(Event::Combat(event));
        }
    }

    fn publish(&mut self, event: Event) {
        self.log.record(&event, &self.world.state.clock, Utc::now());
        self.event_bus.publish(event);
    }
}

/// The turn's active combatant followed by its present dependents.
///
/// Without an explicit `active`, owner-less present combatants take turns in
/// id order; dependents always act with their owner.
fn affected(state: &CombatState, turn: u32, active: Option<CombatantId>) -> Vec<CombatantId> {
    let active = active.or_else(|| {
        let order: Vec<CombatantId> = state
            .roster
            .iter()
            .filter(|c| c.is_present() && c.owner.is_none())
            .map(|c| c.id)
            .collect();
        if order.is_empty() {
            return None;
        }
        order.get(turn as usize % order.len()).copied()
    });
    let Some(active) = active else {
        return Vec::new();
    };

    let mut out = vec![active];
    out.extend(
        state
            .roster
            .iter()
            .filter(|c| c.id != active && c.owner == Some(active) && c.is_present())
            .map(|c| c.id),
    );
    out
}

/// Remembers `target` as the actor's focus when it is an opponent.
fn focus(engine: &mut CombatEngine<'_>, actor: CombatantId, target: Option<CombatantId>) {
    let opposing = target.filter(|target| {
        let roster = &engine.state().roster;
        match (roster.get(actor), roster.get(*target)) {
            (Some(me), Some(other)) => me.opposes(other),
            _ => false,
        }
    });
    if opposing.is_some() {
        let _ = engine.set_target(actor, opposing);
    }
}

fn attack(
    engine: &mut CombatEngine<'_>,
    attacker: CombatantId,
    target: CombatantId,
) -> RuleResult<Vec<MeleeOutcome>> {
    let swings = engine.swings_for(attacker);
    let mut outcomes = Vec::with_capacity(swings as usize);
    for swing in 0..swings {
        match engine.melee(attacker, target, swing) {
            Ok(outcome) => outcomes.push(outcome),
            Err(reason) if outcomes.is_empty() => return Err(reason),
            // The target went down or moved out of reach mid-turn.
            Err(_) => break,
        }
    }
    focus(engine, attacker, Some(target));
    Ok(outcomes)
}

fn refused<T>(command: &'static str, result: RuleResult<T>) -> RuleResult<T> {
    if let Err(reason) = &result {
        debug!(target: "runtime::worker", command, reason = reason.code(), "command refused");
    }
    result
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
