//! Threat ledger: per-hostile aggro table.
//!
//! Target selection order:
//! 1. An eligible forced target (taunt) wins outright.
//! 2. Otherwise the top eligible entry, except that the previously selected
//!    target is retained while its threat stays within `hysteresis_percent`
//!    of the top. Ties on threat go to the lowest id.

use std::collections::BTreeMap;

use crate::state::{CombatClock, CombatantId, RoundStamp};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatEntry {
    pub threat: u64,
    pub last_seen_ms: u64,
}

/// Forced-target override installed by a taunt.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForcedTarget {
    pub target: CombatantId,
    pub expires: RoundStamp,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatTable {
    entries: BTreeMap<CombatantId, ThreatEntry>,
    forced: Option<ForcedTarget>,
    last_target: Option<CombatantId>,
}

impl ThreatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_threat(&mut self, attacker: CombatantId, amount: u64, now_ms: u64) {
        let entry = self.entries.entry(attacker).or_default();
        entry.threat = entry.threat.saturating_add(amount);
        entry.last_seen_ms = now_ms;
    }

    pub fn threat_of(&self, attacker: CombatantId) -> u64 {
        self.entries.get(&attacker).map(|e| e.threat).unwrap_or(0)
    }

    pub fn forced(&self) -> Option<&ForcedTarget> {
        self.forced.as_ref()
    }

    pub fn last_target(&self) -> Option<CombatantId> {
        self.last_target
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest entry among those accepted by `eligible`.
    pub fn top(&self, eligible: impl Fn(CombatantId) -> bool) -> Option<(CombatantId, u64)> {
        self.entries
            .iter()
            .filter(|(id, _)| eligible(**id))
            .fold(None, |best: Option<(CombatantId, u64)>, (id, entry)| match best {
                Some((_, threat)) if threat >= entry.threat => best,
                _ => Some((*id, entry.threat)),
            })
    }

    /// Top threat target with hysteresis and forced-target precedence.
    ///
    /// Records the choice as the last selected target.
    pub fn select_target(
        &mut self,
        hysteresis_percent: u32,
        eligible: impl Fn(CombatantId) -> bool,
    ) -> Option<CombatantId> {
        if let Some(forced) = &self.forced {
            if eligible(forced.target) {
                self.last_target = Some(forced.target);
                return self.last_target;
            }
        }

        let Some((top_id, top_threat)) = self.top(&eligible) else {
            self.last_target = None;
            return None;
        };

        let retained = self
            .last_target
            .filter(|current| *current != top_id && eligible(*current))
            .and_then(|current| self.entries.get(&current).map(|e| (current, e.threat)))
            .filter(|(_, threat)| {
                let keep_floor = u128::from(top_threat)
                    * u128::from(100u32.saturating_sub(hysteresis_percent));
                u128::from(*threat) * 100 >= keep_floor
            })
            .map(|(current, _)| current);

        self.last_target = Some(retained.unwrap_or(top_id));
        self.last_target
    }

    /// Raises the taunter to at least one above every other entry and
    /// installs a forced-target override until `expires`, when given.
    pub fn apply_taunt(
        &mut self,
        taunter: CombatantId,
        expires: Option<RoundStamp>,
        reason: &str,
        now_ms: u64,
    ) {
        let others_top = self
            .entries
            .iter()
            .filter(|(id, _)| **id != taunter)
            .map(|(_, e)| e.threat)
            .max()
            .unwrap_or(0);
        let entry = self.entries.entry(taunter).or_default();
        entry.threat = entry.threat.max(others_top.saturating_add(1));
        entry.last_seen_ms = now_ms;

        if let Some(expires) = expires {
            self.forced = Some(ForcedTarget {
                target: taunter,
                expires,
                reason: reason.to_owned(),
            });
        }
    }

    /// Removes the override once its round is reached, or when it was
    /// stamped in another encounter.
    pub fn clear_expired_forced_target(&mut self, clock: &CombatClock) -> Option<ForcedTarget> {
        let expired = self
            .forced
            .as_ref()
            .map(|f| f.expires.is_reached(clock) || f.expires.is_stale(clock))
            .unwrap_or(false);
        if expired { self.forced.take() } else { None }
    }

    /// Removes `percent` of every entry's threat.
    pub fn decay(&mut self, percent: u32) {
        if percent == 0 {
            return;
        }
        let percent = u128::from(percent.min(100));
        for entry in self.entries.values_mut() {
            // At most `threat`, so the narrowing is lossless.
            let removed = u128::from(entry.threat) * percent / 100;
            entry.threat -= removed as u64;
        }
    }

    /// Forgets `id` entirely: its entry, any override naming it, and the
    /// last-target pointer.
    pub fn remove(&mut self, id: CombatantId) -> bool {
        let had_entry = self.entries.remove(&id).is_some();
        if self.forced.as_ref().map(|f| f.target == id).unwrap_or(false) {
            self.forced = None;
        }
        if self.last_target == Some(id) {
            self.last_target = None;
        }
        had_entry
    }

    /// Up to `n` entries, highest threat first, ties by id.
    pub fn top_entries(&self, n: usize) -> Vec<(CombatantId, ThreatEntry)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(id, e)| (*id, *e)).collect();
        entries.sort_by(|(ia, a), (ib, b)| b.threat.cmp(&a.threat).then(ia.cmp(ib)));
        entries.truncate(n);
        entries
    }
}
