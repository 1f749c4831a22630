//! Authoritative combat state representation.
//!
//! This module owns the data structures that describe combatants, their
//! resources and AI settings, and the combat clock. Runtime layers clone or
//! query this state but mutate it exclusively through the engine.
mod ai;
mod combatant;
mod common;
mod resources;
mod roster;

pub use ai::{AiConfig, AiMemory, AiMode, PetConfigChange, Role, RotationUse};
pub use combatant::{Allegiance, Combatant, KnownAbility};
pub use common::{CombatClock, CombatantId, EncounterId, PacketId, Position, RoundStamp};
pub use resources::{
    BonusLayers, CombatBonuses, CombatStats, ResourceKind, ResourcePool, Resources,
};
pub use roster::Roster;

/// Canonical snapshot of the deterministic combat state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    pub clock: CombatClock,
    pub roster: Roster,
    /// Packet id allocator (monotonically increasing).
    next_packet: u64,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, combatant: Combatant) -> CombatantId {
        self.roster.insert(combatant)
    }

    pub(crate) fn next_packet_id(&mut self) -> PacketId {
        self.next_packet += 1;
        PacketId(self.next_packet)
    }

    /// Id the next packet will receive.
    pub fn peek_packet_id(&self) -> PacketId {
        PacketId(self.next_packet + 1)
    }
}
