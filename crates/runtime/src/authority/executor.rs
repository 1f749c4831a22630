//! Authoritative request execution.
//!
//! Requests run one at a time on the simulation worker. The ownership check
//! runs before any mutation; a rejected request leaves a `warn` log entry and
//! answers with a generic notice.

use std::sync::Arc;

use tracing::{info, warn};

use combat_core::{CombatEngine, FailureReason, RuleResult};

use super::ownership::{OwnershipCheck, may_control};
use super::request::{Request, RequestEnvelope, parse_changes, resolve_pet};
use crate::events::Notice;

pub struct AuthorityExecutor {
    ownership: Arc<dyn OwnershipCheck>,
}

impl AuthorityExecutor {
    pub fn new(ownership: Arc<dyn OwnershipCheck>) -> Self {
        Self { ownership }
    }

    /// Authorizes and applies one request.
    pub fn execute(&self, engine: &mut CombatEngine<'_>, envelope: &RequestEnvelope) -> Notice {
        let requester = envelope.requester;
        let request = &envelope.request;
        let owning = request.owning_combatant();

        if !may_control(self.ownership.as_ref(), engine.state(), requester, owning) {
            warn!(
                target: "runtime::authority",
                %requester,
                combatant = %owning,
                request = request.name(),
                reason = FailureReason::NoPermission.code(),
                "request rejected"
            );
            return Notice::rejected(requester);
        }

        match apply(engine, request) {
            Ok(detail) => {
                info!(
                    target: "runtime::authority",
                    %requester,
                    request = request.name(),
                    detail = %detail,
                    "request applied"
                );
                Notice::applied(requester, detail)
            }
            Err(reason) => {
                warn!(
                    target: "runtime::authority",
                    %requester,
                    request = request.name(),
                    reason = reason.code(),
                    "request refused by rules"
                );
                Notice::rejected(requester)
            }
        }
    }
}

fn apply(engine: &mut CombatEngine<'_>, request: &Request) -> RuleResult<String> {
    match request {
        Request::DismissSummon { owner, kind } => {
            let summon = engine.dismiss(*owner, kind)?;
            Ok(format!("{kind} {summon} dismissed"))
        }
        Request::UpdatePetConfig {
            owner,
            pet,
            kind,
            changes,
        } => {
            let pet = resolve_pet(engine.state(), *owner, *pet, kind.as_deref())?;
            let changes = parse_changes(changes).map_err(|error| {
                warn!(target: "runtime::authority", %pet, %error, "pet config change rejected");
                FailureReason::PrereqNotMet
            })?;
            engine.configure_pet(pet, &changes)?;
            Ok(format!("{} setting(s) updated on {pet}", changes.len()))
        }
        Request::RenamePet {
            owner,
            pet,
            kind,
            nickname,
        } => {
            let pet = resolve_pet(engine.state(), *owner, *pet, kind.as_deref())?;
            engine.rename_pet(pet, nickname.clone())?;
            Ok(format!("{pet} renamed"))
        }
        Request::SwapSummonVariant {
            owner,
            kind,
            variant,
        } => {
            let summon = engine
                .state()
                .roster
                .active_summon(*owner, kind)
                .ok_or(FailureReason::NotFound)?;
            engine.swap_variant(summon, variant.as_deref())?;
            Ok(format!(
                "{summon} now {}",
                variant.as_deref().unwrap_or("default form")
            ))
        }
        Request::ApplyCharm {
            caster,
            target,
            rounds,
        } => {
            engine.apply_charm(*caster, *target, *rounds)?;
            Ok(format!("{target} charmed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{OwnershipTable, ParticipantId};
    use crate::events::NoticeOutcome;
    use combat_core::{
        AbilitySpec, Allegiance, CombatConfig, CombatEnv, CombatState, Combatant, DamageHooks,
        Fnv1aRoll, MemoryCatalog, Position, SummonBase, SummonSpec,
    };
    use serde_json::json;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::default()
            .with_ability(AbilitySpec {
                id: "bite".into(),
                max_rank: 1,
                ..AbilitySpec::default()
            })
            .with_summon(SummonSpec {
                kind: "wolf".into(),
                name: "Wolf".into(),
                base: SummonBase {
                    max_hp: 50,
                    ..SummonBase::default()
                },
                ..SummonSpec::default()
            })
    }

    #[test]
    fn rejects_strangers_and_applies_for_owners() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut state = CombatState::new();
        let hero = state.spawn(
            Combatant::new("hero", Allegiance::Player, 100, 0).at(Position::new(0, 0)),
        );
        let mut engine = CombatEngine::new(&mut state, env);
        let wolf = engine.summon(hero, "wolf", None).unwrap();

        let executor =
            AuthorityExecutor::new(Arc::new(OwnershipTable::new().grant(ParticipantId(1), hero)));

        let rename = Request::UpdatePetConfig {
            owner: hero,
            pet: None,
            kind: Some("wolf".into()),
            changes: json!({"nickname": "Rex"}).as_object().cloned().unwrap_or_default(),
        };
        let notice = executor.execute(&mut engine, &RequestEnvelope::new(ParticipantId(2), rename.clone()));
        assert_eq!(notice.outcome, NoticeOutcome::NotApplied);
        assert_eq!(notice.detail, "request not applied");
        assert_eq!(engine.combatant(wolf).unwrap().ai.nickname, None);

        let notice = executor.execute(&mut engine, &RequestEnvelope::new(ParticipantId(1), rename));
        assert_eq!(notice.outcome, NoticeOutcome::Applied);
        assert_eq!(engine.combatant(wolf).unwrap().display_name(), "Rex");

        let dismiss = Request::DismissSummon {
            owner: hero,
            kind: "wolf".into(),
        };
        let notice = executor.execute(&mut engine, &RequestEnvelope::new(ParticipantId(1), dismiss));
        assert_eq!(notice.outcome, NoticeOutcome::Applied);
        assert!(!engine.combatant(wolf).unwrap().active);
    }

    #[test]
    fn non_whitelisted_keys_change_nothing() {
        let config = CombatConfig::default();
        let catalog = catalog();
        let hooks = DamageHooks::empty();
        let env = CombatEnv::new(&config, &catalog, &hooks, &Fnv1aRoll);
        let mut state = CombatState::new();
        let hero = state.spawn(
            Combatant::new("hero", Allegiance::Player, 100, 0).at(Position::new(0, 0)),
        );
        let mut engine = CombatEngine::new(&mut state, env);
        let wolf = engine.summon(hero, "wolf", None).unwrap();
        let executor =
            AuthorityExecutor::new(Arc::new(OwnershipTable::new().grant(ParticipantId(1), hero)));

        let request = Request::UpdatePetConfig {
            owner: hero,
            pet: Some(wolf),
            kind: None,
            changes: json!({"nickname": "Rex", "allegiance": "hostile"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        };
        let notice = executor.execute(&mut engine, &RequestEnvelope::new(ParticipantId(1), request));
        assert_eq!(notice.outcome, NoticeOutcome::NotApplied);
        assert_eq!(engine.combatant(wolf).unwrap().ai.nickname, None);
    }
}
