//! Mutable record of one packet moving through the pipeline.

use arrayvec::ArrayVec;

use super::checkpoint::PhaseFault;
use super::packet::DamagePacket;
use crate::config::CombatConfig;

/// Which running total a reduction is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Resisted,
    Mitigated,
    Absorbed,
}

/// Running totals for one packet.
///
/// Amounts only shrink; every point removed from a part is credited to exactly
/// one bucket, so `resisted + mitigated + absorbed + applied == incoming`.
#[derive(Clone, Debug)]
pub struct DamageWorkflow {
    packet: DamagePacket,
    remaining: ArrayVec<u32, { CombatConfig::MAX_DAMAGE_PARTS }>,
    pub incoming: u32,
    pub resisted: u32,
    pub mitigated: u32,
    pub absorbed: u32,
    /// Capacity spent per ward index, persisted only on commit.
    pub ward_spend: ArrayVec<u32, { CombatConfig::MAX_WARDS }>,
    pub faults: Vec<PhaseFault>,
}

impl DamageWorkflow {
    pub fn new(packet: DamagePacket, ward_count: usize) -> Self {
        let remaining = packet.parts().iter().map(|part| part.amount).collect();
        let incoming = packet.total();
        Self {
            packet,
            remaining,
            incoming,
            resisted: 0,
            mitigated: 0,
            absorbed: 0,
            ward_spend: core::iter::repeat_n(0, ward_count).collect(),
            faults: Vec::new(),
        }
    }

    pub fn packet(&self) -> &DamagePacket {
        &self.packet
    }

    pub fn remaining(&self) -> &[u32] {
        &self.remaining
    }

    pub(crate) fn remaining_mut(&mut self) -> &mut [u32] {
        &mut self.remaining
    }

    pub(crate) fn split_mut(&mut self) -> (&DamagePacket, &mut [u32]) {
        (&self.packet, &mut self.remaining)
    }

    /// Sum of what is left in every part.
    pub fn applied(&self) -> u32 {
        self.remaining
            .iter()
            .fold(0u32, |sum, amount| sum.saturating_add(*amount))
    }

    /// Removes up to `amount` from part `index`, crediting `bucket`.
    /// Returns what was actually removed.
    pub(crate) fn reduce(&mut self, index: usize, amount: u32, bucket: Bucket) -> u32 {
        let Some(slot) = self.remaining.get_mut(index) else {
            return 0;
        };
        let removed = amount.min(*slot);
        *slot -= removed;
        self.credit(bucket, removed);
        removed
    }

    pub(crate) fn credit(&mut self, bucket: Bucket, amount: u32) {
        match bucket {
            Bucket::Resisted => self.resisted = self.resisted.saturating_add(amount),
            Bucket::Mitigated => self.mitigated = self.mitigated.saturating_add(amount),
            Bucket::Absorbed => self.absorbed = self.absorbed.saturating_add(amount),
        }
    }
}
