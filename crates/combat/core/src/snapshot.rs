//! Read-only views over combat state for inspection tooling.

use crate::combat::{charm_break_chance, mez_break_chance};
use crate::condition::ConditionKind;
use crate::config::CombatConfig;
use crate::state::{CombatState, CombatantId};
use crate::threat::ForcedTarget;

/// Damage step of the charm break preview.
pub const CHARM_PREVIEW_STEP: u32 = 50;
const CHARM_PREVIEW_POINTS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThreatRow {
    pub attacker: CombatantId,
    pub threat: u64,
    pub last_seen_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThreatSnapshot {
    pub hostile: CombatantId,
    /// Highest first.
    pub rows: Vec<ThreatRow>,
    pub forced: Option<ForcedTarget>,
    pub last_target: Option<CombatantId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConditionRow {
    pub kind: ConditionKind,
    pub source: Option<CombatantId>,
    pub expires_round: Option<u32>,
    pub effect_derived: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConditionSnapshot {
    pub combatant: CombatantId,
    pub conditions: Vec<ConditionRow>,
    /// Break chance of the current mesmerize, if any.
    pub mez_break_chance: Option<u32>,
    /// `(damage, chance)` pairs for the current charm, if any.
    pub charm_break_preview: Vec<(u32, u32)>,
}

/// Top `n` threat rows of `hostile`.
pub fn threat_snapshot(state: &CombatState, hostile: CombatantId, n: usize) -> Option<ThreatSnapshot> {
    let table = state.roster.get(hostile)?.threat.as_ref()?;
    Some(ThreatSnapshot {
        hostile,
        rows: table
            .top_entries(n)
            .into_iter()
            .map(|(attacker, entry)| ThreatRow {
                attacker,
                threat: entry.threat,
                last_seen_ms: entry.last_seen_ms,
            })
            .collect(),
        forced: table.forced().cloned(),
        last_target: table.last_target(),
    })
}

pub fn condition_snapshot(
    state: &CombatState,
    id: CombatantId,
    config: &CombatConfig,
) -> Option<ConditionSnapshot> {
    let combatant = state.roster.get(id)?;
    let conditions = combatant
        .conditions
        .active()
        .map(|(kind, slot)| ConditionRow {
            kind,
            source: slot.source,
            expires_round: slot.expiry.map(|e| e.round),
            effect_derived: slot.effect_derived,
        })
        .collect();

    let mez = combatant.conditions.get(ConditionKind::Mesmerized);
    let mez_break_chance = mez
        .active
        .then(|| mez_break_chance(&mez.meta, &config.breaks));

    let charm_break_preview = combatant
        .charm
        .as_ref()
        .map(|record| {
            let mastery = state
                .roster
                .get(record.charmer)
                .map(|c| c.stats.mastery)
                .unwrap_or(0);
            (1..=CHARM_PREVIEW_POINTS)
                .map(|step| {
                    let damage = step * CHARM_PREVIEW_STEP;
                    (damage, charm_break_chance(damage, mastery, &config.breaks))
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ConditionSnapshot {
        combatant: id,
        conditions,
        mez_break_chance,
        charm_break_preview,
    })
}
