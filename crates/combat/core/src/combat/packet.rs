//! Damage packets.
//!
//! A [`DamageRequest`] is what callers build; the engine stamps it with a
//! [`PacketId`] into an immutable [`DamagePacket`] before the pipeline runs.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::{CombatantId, PacketId};

/// Damage type. Everything except physical is elemental and resistible.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter, strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DamageType {
    Physical,
    Fire,
    Cold,
    Lightning,
    Poison,
    Arcane,
}

impl DamageType {
    pub const fn is_elemental(self) -> bool {
        !matches!(self, DamageType::Physical)
    }
}

/// Mitigation category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DamageCategory {
    Physical,
    Spell,
}

/// One typed amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamagePart {
    pub kind: DamageType,
    pub category: DamageCategory,
    pub amount: u32,
}

pub type DamageParts = ArrayVec<DamagePart, { CombatConfig::MAX_DAMAGE_PARTS }>;

/// Caller-built damage request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageRequest {
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub parts: DamageParts,
    pub critical: bool,
    pub ability: Option<String>,
}

impl DamageRequest {
    pub fn new(target: CombatantId) -> Self {
        Self {
            source: None,
            target,
            parts: ArrayVec::new(),
            critical: false,
            ability: None,
        }
    }

    pub fn from(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a part.
    ///
    /// A part sharing kind and category with an existing one merges into it.
    /// Once every slot is taken, further amounts merge into the last part
    /// of the same category (or the last part). The request total saturates
    /// at `u32::MAX`; whatever would exceed it is not added.
    pub fn part(mut self, kind: DamageType, category: DamageCategory, amount: u32) -> Self {
        let amount = amount.min(u32::MAX - total(&self.parts));
        if amount == 0 {
            return self;
        }
        if let Some(existing) = self
            .parts
            .iter_mut()
            .find(|p| p.kind == kind && p.category == category)
        {
            existing.amount += amount;
            return self;
        }
        if self.parts.is_full() {
            let slot = self.parts.iter().rposition(|p| p.category == category);
            let last = self.parts.len() - 1;
            self.parts[slot.unwrap_or(last)].amount += amount;
            return self;
        }
        self.parts.push(DamagePart {
            kind,
            category,
            amount,
        });
        self
    }

    pub fn physical(self, amount: u32) -> Self {
        self.part(DamageType::Physical, DamageCategory::Physical, amount)
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = Some(ability.into());
        self
    }

    pub(crate) fn stamp(self, id: PacketId) -> DamagePacket {
        DamagePacket {
            id,
            source: self.source,
            target: self.target,
            parts: self.parts,
            critical: self.critical,
            ability: self.ability,
        }
    }
}

/// Immutable damage packet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamagePacket {
    id: PacketId,
    source: Option<CombatantId>,
    target: CombatantId,
    parts: DamageParts,
    critical: bool,
    ability: Option<String>,
}

impl DamagePacket {
    pub fn id(&self) -> PacketId {
        self.id
    }

    pub fn source(&self) -> Option<CombatantId> {
        self.source
    }

    pub fn target(&self) -> CombatantId {
        self.target
    }

    pub fn parts(&self) -> &[DamagePart] {
        &self.parts
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn ability(&self) -> Option<&str> {
        self.ability.as_deref()
    }

    /// Sum of all parts, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        total(&self.parts)
    }
}

fn total(parts: &[DamagePart]) -> u32 {
    parts
        .iter()
        .fold(0u32, |sum, part| sum.saturating_add(part.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn matching_parts_merge() {
        let request = DamageRequest::new(CombatantId(1))
            .physical(10)
            .part(DamageType::Fire, DamageCategory::Spell, 5)
            .physical(7);
        assert_eq!(request.parts.len(), 2);
        assert_eq!(request.parts[0].amount, 17);
    }

    #[test]
    fn total_saturates_instead_of_wrapping() {
        let packet = DamageRequest::new(CombatantId(1))
            .physical(u32::MAX)
            .physical(u32::MAX)
            .part(DamageType::Cold, DamageCategory::Spell, 9)
            .stamp(PacketId(1));
        assert_eq!(packet.total(), u32::MAX);
        assert_eq!(packet.parts().len(), 1);
    }

    #[test]
    fn amounts_past_capacity_are_kept() {
        let mut request = DamageRequest::new(CombatantId(1));
        for kind in DamageType::iter() {
            request = request
                .part(kind, DamageCategory::Physical, 1)
                .part(kind, DamageCategory::Spell, 1);
        }
        let packet = request.stamp(PacketId(1));
        assert_eq!(packet.parts().len(), CombatConfig::MAX_DAMAGE_PARTS);
        assert_eq!(packet.total(), 12);
    }
}
