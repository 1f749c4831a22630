//! Deterministic combat rules shared by the runtime and offline tools.
//!
//! `combat-core` defines the canonical combat state (conditions, cooldowns,
//! threat, summons, charm, maintained effects) and the damage pipeline, and
//! exposes pure APIs over them. All state mutation flows through
//! [`engine::CombatEngine`]; expected failures are [`FailureReason`] values.
pub mod catalog;
pub mod charm;
pub mod combat;
pub mod condition;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod events;
pub mod movement;
pub mod roll;
pub mod snapshot;
pub mod song;
pub mod state;
pub mod summon;
pub mod threat;

pub use catalog::{
    AbilitySpec, AbilityTag, Amount, CatalogOracle, EffectSpec, MemoryCatalog, SongSpec,
    SummonBase, SummonSpec, SummonVariant, TargetKind,
};
pub use charm::{AllegianceSnapshot, CharmRecord, ReleaseReason};
pub use combat::{
    Checkpoint, CheckpointContext, DamageCategory, DamageHook, DamageHooks, DamagePacket,
    DamagePart, DamageRequest, DamageType, DamageWorkflow, Defenses, FaultKind, HookCriticality,
    HookError, Mitigation, PhaseFault, Ward, WardFilter,
};
pub use condition::{
    ConditionDuration, ConditionKind, ConditionLedger, ConditionMask, ConditionMeta,
    PassiveEffect,
};
pub use config::CombatConfig;
pub use cooldown::{CooldownKey, CooldownMap, CooldownSpec, CooldownStamp};
pub use engine::{
    CastOutcome, CastPlan, CombatEngine, CombatEnv, DamageOptions, DamageOutcome, MeleeOutcome,
    TurnReport,
};
pub use error::{ErrorSeverity, FailureReason, RuleError, RuleResult};
pub use events::CombatEvent;
pub use movement::{MovePlan, distance};
pub use roll::{Fnv1aRoll, RollKey, RollOracle};
pub use snapshot::{ConditionSnapshot, ThreatSnapshot, condition_snapshot, threat_snapshot};
pub use song::{SongBook, SongInstance};
pub use state::{
    AiConfig, AiMemory, AiMode, Allegiance, CombatClock, CombatState, CombatStats, Combatant,
    CombatantId, EncounterId, PacketId, PetConfigChange, Position, Resources, Role, RoundStamp,
};
pub use summon::{CHARM_KIND, DespawnReason, SummonRecord};
pub use threat::{ForcedTarget, ThreatTable};
