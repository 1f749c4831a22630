use std::fmt;

/// Unique identifier for any participant tracked in the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl CombatantId {
    /// Sentinel used in roll keys when a packet has no source.
    pub const NONE: Self = Self(u32::MAX);
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of one combat encounter. Round-scoped state is keyed to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterId(pub u32);

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enc-{}", self.0)
    }
}

/// Identifier of one damage packet, unique within a combat state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketId(pub u64);

/// Discrete grid position expressed in cell coordinates.
///
/// North is `+y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A round stamped inside a specific encounter.
///
/// Only meaningful while that encounter is the active one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundStamp {
    pub encounter: EncounterId,
    pub round: u32,
}

impl RoundStamp {
    pub const fn new(encounter: EncounterId, round: u32) -> Self {
        Self { encounter, round }
    }

    /// True when this stamp belongs to the clock's active encounter and its
    /// round has been reached.
    pub fn is_reached(&self, clock: &CombatClock) -> bool {
        clock.encounter == Some(self.encounter) && clock.round >= self.round
    }

    /// True when the stamp was made in an encounter other than the active one.
    pub fn is_stale(&self, clock: &CombatClock) -> bool {
        clock.encounter != Some(self.encounter)
    }
}

/// Combat timekeeping frame: `(encounter, round, turn)` plus wall-clock time.
///
/// `now_ms` is supplied by the caller; the rules never read a system clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatClock {
    pub encounter: Option<EncounterId>,
    pub round: u32,
    pub turn: u32,
    pub now_ms: u64,
}

impl CombatClock {
    /// A clock outside of any encounter.
    pub const fn idle(now_ms: u64) -> Self {
        Self {
            encounter: None,
            round: 0,
            turn: 0,
            now_ms,
        }
    }

    pub const fn in_encounter(encounter: EncounterId, round: u32, turn: u32) -> Self {
        Self {
            encounter: Some(encounter),
            round,
            turn,
            now_ms: 0,
        }
    }

    pub const fn with_now(mut self, now_ms: u64) -> Self {
        self.now_ms = now_ms;
        self
    }

    pub const fn is_active(&self) -> bool {
        self.encounter.is_some()
    }

    /// Stamp `rounds` rounds from now in the active encounter, if any.
    pub fn rounds_from_now(&self, rounds: u32) -> Option<RoundStamp> {
        self.encounter
            .map(|encounter| RoundStamp::new(encounter, self.round.saturating_add(rounds)))
    }

    /// Stamp an explicit round in the active encounter, if any.
    pub fn at_round(&self, round: u32) -> Option<RoundStamp> {
        self.encounter.map(|encounter| RoundStamp::new(encounter, round))
    }

    /// The `(encounter, round, turn)` triple, if an encounter is active.
    pub fn triple(&self) -> Option<(EncounterId, u32, u32)> {
        self.encounter.map(|encounter| (encounter, self.round, self.turn))
    }
}
