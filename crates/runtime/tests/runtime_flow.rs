//! End-to-end flows through [`RuntimeHandle`] against the bundled content.

use std::time::Duration;

use async_trait::async_trait;

use combat_content::ContentFactory;
use combat_core::{
    Allegiance, Checkpoint, CheckpointContext, CombatEvent, CombatState, Combatant, CombatantId,
    DamageHook, DamageHooks, DamageOptions, DamageRequest, EncounterId, FailureReason, FaultKind,
    HookCriticality, HookError, Position,
};
use combat_runtime::{
    Confirmation, ConfirmationProvider, Event, NoticeOutcome, OwnershipTable, ParticipantId,
    PendingStep, Runtime, RuntimeBuilder, RuntimeConfig, RuntimeError, RuntimeHandle, SkipReason,
    Topic, TurnEvent,
};

const SEAT: ParticipantId = ParticipantId(1);
const STRANGER: ParticipantId = ParticipantId(2);

struct Scene {
    runtime: Runtime,
    hero: CombatantId,
    orc: CombatantId,
}

impl Scene {
    fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }
}

fn builder() -> (RuntimeBuilder, CombatantId, CombatantId) {
    let content = ContentFactory::bundled();
    let config = content.load_config().expect("bundled config");
    let catalog = content.load_catalog().expect("bundled catalog");

    let mut state = CombatState::new();
    let hero = state.spawn(
        Combatant::new("hero", Allegiance::Player, 300, 200)
            .at(Position::new(0, 0))
            .with_level(10)
            .with_ability("firebolt")
            .with_ability("mesmerize"),
    );
    let orc = state.spawn(Combatant::new("orc", Allegiance::Hostile, 800, 0).at(Position::new(4, 0)));

    let builder = Runtime::builder()
        .config(RuntimeConfig {
            combat: config,
            ..RuntimeConfig::default()
        })
        .initial_state(state)
        .catalog(catalog)
        .ownership(OwnershipTable::new().grant(SEAT, hero));
    (builder, hero, orc)
}

async fn scene() -> Scene {
    let (builder, hero, orc) = builder();
    let runtime = builder.build().await.expect("runtime builds");
    runtime
        .handle()
        .begin_encounter(EncounterId(1))
        .await
        .expect("encounter starts");
    Scene { runtime, hero, orc }
}

struct Decline;

#[async_trait]
impl ConfirmationProvider for Decline {
    async fn confirm(&self, _step: &PendingStep) -> Confirmation {
        Confirmation::Cancel
    }
}

struct Flaky;

impl DamageHook for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Optional
    }

    fn on_checkpoint(&self, ctx: &mut CheckpointContext<'_>) -> Result<(), HookError> {
        if matches!(ctx.checkpoint, Checkpoint::AfterMitigate) {
            return Err(HookError::Failed("lost its table".into()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn build_requires_catalog() {
    let result = Runtime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::MissingCatalog)));
}

#[tokio::test]
async fn pet_assists_its_owner_target() {
    let scene = scene().await;
    let handle = scene.handle();

    let wolf = handle.summon(scene.hero, "wolf", None).await.expect("wolf summoned");
    handle
        .cast(scene.hero, "firebolt", Some(scene.orc))
        .await
        .expect("firebolt lands");

    let outcome = handle
        .advance_turn_for(1, 0, Some(scene.hero))
        .await
        .expect("turn runs");
    assert!(outcome.skipped.is_none());

    let wolf_turn = outcome
        .decisions
        .iter()
        .find(|d| d.actor == wolf)
        .expect("wolf acted with its owner");
    assert_eq!(wolf_turn.target, Some(scene.orc));
    assert!(wolf_turn.acted());

    let threat = handle.threat_snapshot(scene.orc, 5).await.expect("orc has threat");
    assert!(threat.rows.iter().any(|row| row.attacker == scene.hero));

    drop(handle);
    scene.runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn repeated_trigger_is_skipped() {
    let scene = scene().await;
    let handle = scene.handle();
    let mut turns = handle.subscribe(Topic::Turn);

    let first = handle.advance_turn(1, 0).await.expect("first trigger");
    assert!(first.skipped.is_none());

    let second = handle.advance_turn(1, 0).await.expect("second trigger");
    assert_eq!(second.skipped, Some(SkipReason::Duplicate));
    assert!(second.decisions.is_empty());

    let mut saw_skip = false;
    while let Ok(event) = turns.try_recv() {
        if let Event::Turn(TurnEvent::Skipped { reason, .. }) = event {
            assert_eq!(reason, SkipReason::Duplicate);
            saw_skip = true;
        }
    }
    assert!(saw_skip);
}

#[tokio::test]
async fn triggers_inside_min_interval_are_too_soon() {
    let (builder, _, _) = builder();
    let runtime = builder
        .config(RuntimeConfig {
            min_turn_interval: Duration::from_secs(3600),
            ..RuntimeConfig::default()
        })
        .build()
        .await
        .expect("runtime builds");
    let handle = runtime.handle();
    handle.begin_encounter(EncounterId(7)).await.expect("encounter starts");

    let first = handle.advance_turn(1, 0).await.expect("first trigger");
    assert!(first.skipped.is_none());

    let second = handle.advance_turn(1, 1).await.expect("second trigger");
    assert_eq!(second.skipped, Some(SkipReason::TooSoon));
}

#[tokio::test]
async fn strangers_get_the_generic_notice() {
    let scene = scene().await;
    let handle = scene.handle();
    let mut notices = handle.subscribe(Topic::Notice);

    handle.summon(scene.hero, "wolf", None).await.expect("wolf summoned");
    let body = format!(r#"{{"type": "dismissSummon", "owner": {}, "kind": "wolf"}}"#, scene.hero.0);

    let rejected = handle.submit_json(STRANGER, &body).await.expect("notice");
    assert_eq!(rejected.outcome, NoticeOutcome::NotApplied);
    assert_eq!(rejected.requester, STRANGER);
    let state = handle.query_state().await.expect("state");
    assert!(state.roster.active_summon(scene.hero, "wolf").is_some());

    let applied = handle.submit_json(SEAT, &body).await.expect("notice");
    assert_eq!(applied.outcome, NoticeOutcome::Applied);
    let state = handle.query_state().await.expect("state");
    assert!(state.roster.active_summon(scene.hero, "wolf").is_none());

    let first = notices.recv().await.expect("notice published");
    assert!(matches!(first, Event::Notice(n) if n.outcome == NoticeOutcome::NotApplied));
}

#[tokio::test]
async fn unknown_config_keys_reject_the_whole_change() {
    let scene = scene().await;
    let handle = scene.handle();
    let wolf = handle.summon(scene.hero, "wolf", None).await.expect("wolf summoned");

    let body = format!(
        r#"{{"type": "updatePetConfig", "owner": {}, "kind": "wolf", "changes": {{"mode": "passive", "hp": 9999}}}}"#,
        scene.hero.0
    );
    let notice = handle.submit_json(SEAT, &body).await.expect("notice");
    assert_eq!(notice.outcome, NoticeOutcome::NotApplied);

    let state = handle.query_state().await.expect("state");
    let wolf = state.roster.get(wolf).expect("wolf present");
    assert_ne!(wolf.ai.mode, combat_core::AiMode::Passive);
}

#[tokio::test]
async fn malformed_payload_is_an_error() {
    let scene = scene().await;
    let result = scene.handle().submit_json(SEAT, r#"{"type": "grantGold"}"#).await;
    assert!(matches!(result, Err(RuntimeError::InvalidPayload(_))));
}

#[tokio::test]
async fn declined_cast_commits_nothing() {
    let (builder, hero, orc) = builder();
    let runtime = builder.confirmation(Decline).build().await.expect("runtime builds");
    let handle = runtime.handle();
    handle.begin_encounter(EncounterId(3)).await.expect("encounter starts");

    let sprite = handle.summon(hero, "sprite", None).await.expect("sprite summoned");
    let outcome = handle.advance_turn_for(1, 0, Some(hero)).await.expect("turn runs");

    let decision = outcome
        .decisions
        .iter()
        .find(|d| d.actor == sprite)
        .expect("sprite decided");
    assert!(decision.cancelled);
    assert!(decision.cast.is_none());

    let state = handle.query_state().await.expect("state");
    let sprite = state.roster.get(sprite).expect("sprite present");
    assert_eq!(sprite.resources.mana.current, sprite.resources.mana.max);
    let orc = state.roster.get(orc).expect("orc present");
    assert_eq!(orc.resources.hp.current, orc.resources.hp.max);
}

#[tokio::test]
async fn mesmerize_shows_its_break_chance() {
    let scene = scene().await;
    let handle = scene.handle();

    handle
        .cast(scene.hero, "mesmerize", Some(scene.orc))
        .await
        .expect("mesmerize lands");

    let snapshot = handle.condition_snapshot(scene.orc).await.expect("snapshot");
    assert_eq!(snapshot.combatant, scene.orc);
    assert_eq!(snapshot.mez_break_chance, Some(35));
    assert!(!snapshot.conditions.is_empty());

    let recent = handle.recent_events(3).await.expect("log");
    assert!(!recent.is_empty());
    assert!(recent.windows(2).all(|pair| pair[0].seq < pair[1].seq));
}

#[tokio::test]
async fn snapshots_of_unknown_combatants_fail() {
    let scene = scene().await;
    let handle = scene.handle();
    let ghost = CombatantId(404);

    assert!(matches!(
        handle.condition_snapshot(ghost).await,
        Err(RuntimeError::UnknownCombatant(id)) if id == ghost
    ));
    assert!(matches!(
        handle.threat_snapshot(ghost, 3).await,
        Err(RuntimeError::UnknownCombatant(_))
    ));
}

#[tokio::test]
async fn unknown_abilities_are_rule_refusals() {
    let scene = scene().await;
    let result = scene.handle().cast(scene.hero, "meteor", Some(scene.orc)).await;
    assert!(matches!(result, Err(RuntimeError::Rule(FailureReason::CatalogNotFound))));
}

#[tokio::test]
async fn failing_hook_is_reverted_and_reported() {
    let (builder, hero, orc) = builder();
    let runtime = builder
        .hooks(DamageHooks::new(vec![std::sync::Arc::new(Flaky)]))
        .build()
        .await
        .expect("runtime builds");
    let handle = runtime.handle();
    let mut combat = handle.subscribe(Topic::Combat);

    let outcome = handle
        .apply_damage(DamageRequest::new(orc).from(hero).physical(30), DamageOptions::default())
        .await
        .expect("damage resolves");
    assert!(outcome.committed);
    assert_eq!(outcome.faults.len(), 1);
    assert_eq!(outcome.faults[0].hook, "flaky");
    assert!(matches!(outcome.faults[0].kind, FaultKind::Failed(_)));

    let mut faulted = false;
    while let Ok(event) = combat.try_recv() {
        if let Event::Combat(CombatEvent::PhaseFaulted { fault, .. }) = event {
            assert_eq!(fault.checkpoint, Checkpoint::AfterMitigate);
            faulted = true;
        }
    }
    assert!(faulted);
}
