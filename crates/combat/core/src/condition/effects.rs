use bitflags::bitflags;

use super::ConditionKind;

bitflags! {
    /// Set of condition kinds, one bit per [`ConditionKind`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ConditionMask: u8 {
        const MUTED       = 1 << 0;
        const MESMERIZED  = 1 << 1;
        const IMMOBILIZED = 1 << 2;
        const SLOWED      = 1 << 3;
        const CHARMED     = 1 << 4;
        const STUNNED     = 1 << 5;
    }
}

impl ConditionMask {
    pub const fn from_kind(kind: ConditionKind) -> Self {
        match kind {
            ConditionKind::Muted => Self::MUTED,
            ConditionKind::Mesmerized => Self::MESMERIZED,
            ConditionKind::Immobilized => Self::IMMOBILIZED,
            ConditionKind::Slowed => Self::SLOWED,
            ConditionKind::Charmed => Self::CHARMED,
            ConditionKind::Stunned => Self::STUNNED,
        }
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = ConditionKind>) -> Self {
        kinds
            .into_iter()
            .fold(Self::empty(), |mask, kind| mask | Self::from_kind(kind))
    }
}

/// A passive effect attached to a combatant (aura, equipment, lingering spell).
///
/// Enabled passives imply conditions through the configured
/// effect→condition table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassiveEffect {
    pub key: String,
    pub enabled: bool,
    /// Slow strength carried into an implied slowed condition.
    pub slow_percent: Option<u32>,
}

impl PassiveEffect {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            enabled: true,
            slow_percent: None,
        }
    }

    pub fn with_slow(mut self, percent: u32) -> Self {
        self.slow_percent = Some(percent);
        self
    }
}
