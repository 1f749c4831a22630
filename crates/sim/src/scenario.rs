//! Scripted encounter: a hero with a wolf against two hostiles.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{info, warn};

use combat_core::{Allegiance, CombatState, Combatant, CombatantId, EncounterId, Position, Role};
use combat_runtime::{OwnershipTable, ParticipantId, Runtime, RuntimeError, RuntimeHandle};

use crate::config::SimConfig;

const SEAT: ParticipantId = ParticipantId(1);
const SPECTATOR: ParticipantId = ParticipantId(2);

struct Cast {
    hero: CombatantId,
    hostiles: Vec<CombatantId>,
}

fn roster() -> (CombatState, Cast) {
    let mut state = CombatState::new();
    let hero = state.spawn(
        Combatant::new("hero", Allegiance::Player, 320, 240)
            .at(Position::new(0, 0))
            .with_level(12)
            .with_ability("firebolt")
            .with_ability("mesmerize"),
    );
    let orc = state.spawn(
        Combatant::new("orc", Allegiance::Hostile, 420, 0)
            .at(Position::new(5, 0))
            .with_level(10)
            .with_role(Role::Tank),
    );
    let goblin = state.spawn(
        Combatant::new("goblin", Allegiance::Hostile, 180, 0)
            .at(Position::new(4, 4))
            .with_level(8),
    );
    (
        state,
        Cast {
            hero,
            hostiles: vec![orc, goblin],
        },
    )
}

pub async fn run(config: &SimConfig) -> Result<Value> {
    let content = config.content();
    let combat = config.load_combat()?;
    let catalog = content.load_catalog().context("loading catalog")?;

    let (state, cast) = roster();
    let runtime = Runtime::builder()
        .config(config.runtime_config(combat))
        .initial_state(state)
        .catalog(catalog)
        .ownership(OwnershipTable::new().grant(SEAT, cast.hero))
        .build()
        .await?;
    let handle = runtime.handle();

    handle.begin_encounter(EncounterId(1)).await?;
    let wolf = handle.summon(cast.hero, "wolf", None).await?;
    info!(%wolf, "wolf summoned");

    let requests = submit_requests(&handle, cast.hero).await?;

    let mut turns = Vec::new();
    for round in 1..=config.rounds {
        for turn in 0..3 {
            if turn == 0 {
                hero_action(&handle, &cast).await?;
            }
            let outcome = handle.advance_turn(round, turn).await?;
            turns.push(json!({
                "round": round,
                "turn": turn,
                "outcome": outcome,
            }));
        }
    }

    let mut threat = Vec::new();
    let mut conditions = Vec::new();
    for &hostile in &cast.hostiles {
        threat.push(serde_json::to_value(handle.threat_snapshot(hostile, 3).await?)?);
        conditions.push(serde_json::to_value(handle.condition_snapshot(hostile).await?)?);
    }
    let events = handle.recent_events(config.event_log).await?;

    handle.end_encounter().await?;
    runtime.shutdown().await?;

    Ok(json!({
        "requests": requests,
        "turns": turns,
        "threat": threat,
        "conditions": conditions,
        "events": events,
    }))
}

/// One request from the pet's owner and one from a spectator.
async fn submit_requests(handle: &RuntimeHandle, hero: CombatantId) -> Result<Vec<Value>> {
    let configure = json!({
        "type": "updatePetConfig",
        "owner": hero,
        "kind": "wolf",
        "changes": { "autoTaunt": true },
    })
    .to_string();
    let rename = json!({
        "type": "renamePet",
        "owner": hero,
        "kind": "wolf",
        "nickname": "Fang",
    })
    .to_string();

    let mut notices = Vec::new();
    for (requester, body) in [(SEAT, &configure), (SPECTATOR, &rename), (SEAT, &rename)] {
        let notice = handle.submit_json(requester, body).await?;
        notices.push(serde_json::to_value(notice)?);
    }
    Ok(notices)
}

/// The hero bolts the first standing hostile and keeps the second one
/// mesmerized whenever the cooldown allows.
async fn hero_action(handle: &RuntimeHandle, cast: &Cast) -> Result<()> {
    let state = handle.query_state().await?;
    let standing: Vec<CombatantId> = cast
        .hostiles
        .iter()
        .copied()
        .filter(|id| state.roster.get(*id).is_some_and(|c| c.is_present()))
        .collect();

    let Some(&primary) = standing.first() else {
        return Ok(());
    };
    if let Some(&add) = standing.get(1) {
        log_refusal("mesmerize", handle.cast(cast.hero, "mesmerize", Some(add)).await)?;
    }
    log_refusal("firebolt", handle.cast(cast.hero, "firebolt", Some(primary)).await)
}

fn log_refusal<T>(ability: &str, result: combat_runtime::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(RuntimeError::Rule(reason)) => {
            warn!(ability, reason = reason.code(), "hero action refused");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
