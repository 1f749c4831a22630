//! Events emitted by engine operations.
//!
//! The engine records what happened; the runtime decides where it goes
//! (event bus, rolling log, notices).

use crate::charm::ReleaseReason;
use crate::combat::PhaseFault;
use crate::condition::ConditionKind;
use crate::error::FailureReason;
use crate::state::{CombatantId, EncounterId, PacketId, Position};
use crate::summon::DespawnReason;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum CombatEvent {
    EncounterStarted {
        encounter: EncounterId,
    },
    EncounterEnded {
        encounter: EncounterId,
    },
    TurnAdvanced {
        encounter: EncounterId,
        round: u32,
        turn: u32,
        new_round: bool,
    },
    ConditionApplied {
        target: CombatantId,
        kind: ConditionKind,
        source: Option<CombatantId>,
    },
    ConditionCleared {
        target: CombatantId,
        kind: ConditionKind,
    },
    DamageResolved {
        packet: PacketId,
        source: Option<CombatantId>,
        target: CombatantId,
        incoming: u32,
        resisted: u32,
        mitigated: u32,
        absorbed: u32,
        applied: u32,
        committed: bool,
    },
    PhaseFaulted {
        packet: PacketId,
        fault: PhaseFault,
    },
    BreakRolled {
        packet: PacketId,
        target: CombatantId,
        kind: ConditionKind,
        chance: u32,
        broken: bool,
    },
    Healed {
        target: CombatantId,
        amount: u32,
    },
    Defeated {
        target: CombatantId,
    },
    ThreatAdded {
        hostile: CombatantId,
        attacker: CombatantId,
        amount: u64,
    },
    TauntApplied {
        hostile: CombatantId,
        taunter: CombatantId,
        until_round: Option<u32>,
    },
    ForcedTargetCleared {
        hostile: CombatantId,
        target: CombatantId,
    },
    SummonSpawned {
        owner: CombatantId,
        summon: CombatantId,
        kind: String,
        position: Position,
    },
    SummonDespawned {
        owner: CombatantId,
        summon: CombatantId,
        kind: String,
        reason: DespawnReason,
    },
    VariantSwapped {
        summon: CombatantId,
        variant: Option<String>,
    },
    PetRenamed {
        pet: CombatantId,
        nickname: Option<String>,
    },
    CharmApplied {
        charmer: CombatantId,
        target: CombatantId,
        until_round: Option<u32>,
    },
    CharmReleased {
        charmer: CombatantId,
        target: CombatantId,
        reason: ReleaseReason,
    },
    SongRegistered {
        performer: CombatantId,
        ability: String,
    },
    SongEvicted {
        performer: CombatantId,
        ability: String,
    },
    SongExpired {
        performer: CombatantId,
        ability: String,
    },
    SongPulsed {
        performer: CombatantId,
        ability: String,
        target: CombatantId,
    },
    AbilityCast {
        caster: CombatantId,
        ability: String,
        target: CombatantId,
    },
    AttackMissed {
        attacker: CombatantId,
        target: CombatantId,
        chance: u32,
    },
    Moved {
        actor: CombatantId,
        from: Position,
        to: Position,
    },
    RankUp {
        actor: CombatantId,
        ability: String,
        rank: u32,
    },
    /// A declared effect could not apply. The rest of the ability resolved.
    EffectFailed {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        effect: &'static str,
        reason: FailureReason,
    },
}

impl CombatEvent {
    /// Short stable name, used as the log label.
    pub fn name(&self) -> &'static str {
        match self {
            CombatEvent::EncounterStarted { .. } => "encounter-started",
            CombatEvent::EncounterEnded { .. } => "encounter-ended",
            CombatEvent::TurnAdvanced { .. } => "turn-advanced",
            CombatEvent::ConditionApplied { .. } => "condition-applied",
            CombatEvent::ConditionCleared { .. } => "condition-cleared",
            CombatEvent::DamageResolved { .. } => "damage-resolved",
            CombatEvent::PhaseFaulted { .. } => "phase-faulted",
            CombatEvent::BreakRolled { .. } => "break-rolled",
            CombatEvent::Healed { .. } => "healed",
            CombatEvent::Defeated { .. } => "defeated",
            CombatEvent::ThreatAdded { .. } => "threat-added",
            CombatEvent::TauntApplied { .. } => "taunt-applied",
            CombatEvent::ForcedTargetCleared { .. } => "forced-target-cleared",
            CombatEvent::SummonSpawned { .. } => "summon-spawned",
            CombatEvent::SummonDespawned { .. } => "summon-despawned",
            CombatEvent::VariantSwapped { .. } => "variant-swapped",
            CombatEvent::PetRenamed { .. } => "pet-renamed",
            CombatEvent::CharmApplied { .. } => "charm-applied",
            CombatEvent::CharmReleased { .. } => "charm-released",
            CombatEvent::SongRegistered { .. } => "song-registered",
            CombatEvent::SongEvicted { .. } => "song-evicted",
            CombatEvent::SongExpired { .. } => "song-expired",
            CombatEvent::SongPulsed { .. } => "song-pulsed",
            CombatEvent::AbilityCast { .. } => "ability-cast",
            CombatEvent::AttackMissed { .. } => "attack-missed",
            CombatEvent::Moved { .. } => "moved",
            CombatEvent::RankUp { .. } => "rank-up",
            CombatEvent::EffectFailed { .. } => "effect-failed",
        }
    }

    /// True for events that only matter at turn granularity.
    pub fn is_turn_event(&self) -> bool {
        matches!(
            self,
            CombatEvent::EncounterStarted { .. }
                | CombatEvent::EncounterEnded { .. }
                | CombatEvent::TurnAdvanced { .. }
        )
    }
}
