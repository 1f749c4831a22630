//! Roll oracle for deterministic pseudo-random outcomes.
//!
//! Break checks and hit checks never draw from a stateful generator. Each
//! roll hashes a composite key describing the event, so replaying the same
//! inputs always reproduces the same outcome.
//!
//! # Key Composition
//!
//! Keys are built with [`RollKey`]; every field is written as little-endian
//! bytes (strings as UTF-8) followed by a `|` separator:
//!
//! | call site | fields |
//! |-----------|--------|
//! | break check | `"break"`, packet id, condition kind, target, source (or `u32::MAX`), round, turn, applied amount |
//! | hit check | `"hit"`, packet id, attacker, target, round, turn, swing index |

use crate::state::{CombatClock, CombatantId, PacketId};

/// 32-bit FNV-1a offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// 32-bit FNV-1a prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

const SEPARATOR: u8 = b'|';

/// 32-bit FNV-1a over a byte slice.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Composite roll key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollKey {
    bytes: Vec<u8>,
}

impl RollKey {
    pub fn new(tag: &str) -> Self {
        Self::default().text(tag)
    }

    pub fn text(mut self, value: &str) -> Self {
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(SEPARATOR);
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self.bytes.push(SEPARATOR);
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self.bytes.push(SEPARATOR);
        self
    }

    pub fn packet(self, id: PacketId) -> Self {
        self.u64(id.0)
    }

    pub fn combatant(self, id: Option<CombatantId>) -> Self {
        self.u32(id.unwrap_or(CombatantId::NONE).0)
    }

    /// Appends round then turn.
    pub fn clock(self, clock: &CombatClock) -> Self {
        self.u32(clock.round).u32(clock.turn)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Deterministic roll source.
pub trait RollOracle: Send + Sync {
    /// 32-bit hash of the key.
    fn hash(&self, key: &RollKey) -> u32;

    /// Uniform value in `[0, 1)`.
    fn unit(&self, key: &RollKey) -> f64 {
        f64::from(self.hash(key)) / 4_294_967_296.0
    }

    /// True when the roll lands under `percent`.
    ///
    /// Integer form of `unit(key) < percent / 100`.
    fn passes(&self, key: &RollKey, percent: u32) -> bool {
        u64::from(self.hash(key)) * 100 < u64::from(percent) << 32
    }
}

/// FNV-1a roll oracle.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fnv1aRoll;

impl RollOracle for Fnv1aRoll {
    fn hash(&self, key: &RollKey) -> u32 {
        fnv1a32(key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn identical_keys_roll_identically() {
        let clock = CombatClock::in_encounter(crate::state::EncounterId(3), 4, 2);
        let key = || {
            RollKey::new("break")
                .packet(PacketId(17))
                .text("mesmerized")
                .combatant(Some(CombatantId(9)))
                .combatant(None)
                .clock(&clock)
                .u32(42)
        };
        let roll = Fnv1aRoll;
        for percent in [0, 35, 50, 100] {
            assert_eq!(roll.passes(&key(), percent), roll.passes(&key(), percent));
        }
        assert_eq!(roll.unit(&key()), roll.unit(&key()));
    }

    #[test]
    fn bounds_are_exclusive_and_inclusive() {
        let roll = Fnv1aRoll;
        let key = RollKey::new("hit").u32(1);
        assert!(!roll.passes(&key, 0));
        assert!(roll.passes(&key, 100));
        let unit = roll.unit(&key);
        assert!((0.0..1.0).contains(&unit));
    }
}
