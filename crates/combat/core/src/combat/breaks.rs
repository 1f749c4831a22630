//! Break-on-damage chances for crowd control.
//!
//! Each damaging packet that lands on a mesmerized or charmed target rolls
//! exactly one check per condition. See [`crate::roll`] for the key layout.

use crate::condition::{ConditionKind, ConditionMeta};
use crate::config::BreakConfig;
use crate::roll::RollKey;
use crate::state::{CombatClock, CombatantId, PacketId};

/// Mesmerize break chance: the condition's override, else the default.
pub fn mez_break_chance(meta: &ConditionMeta, config: &BreakConfig) -> u32 {
    meta.break_percent.unwrap_or(config.mez_default_percent)
}

/// Charm break chance for `applied` damage against a charmer with `mastery`.
///
/// `base + step * floor(applied / step_damage) - mastery * reduction`,
/// clamped to `[min, max]`.
pub fn charm_break_chance(applied: u32, mastery: u32, config: &BreakConfig) -> u32 {
    let steps = if config.charm_step_damage == 0 {
        0
    } else {
        i64::from(applied / config.charm_step_damage)
    };
    let raw = i64::from(config.charm_base_percent) + i64::from(config.charm_step_percent) * steps
        - i64::from(mastery) * i64::from(config.charm_mastery_reduction_percent);
    raw.clamp(
        i64::from(config.charm_min_percent),
        i64::from(config.charm_max_percent),
    ) as u32
}

/// Roll key for a break check.
pub fn break_key(
    packet: PacketId,
    kind: ConditionKind,
    target: CombatantId,
    source: Option<CombatantId>,
    clock: &CombatClock,
    applied: u32,
) -> RollKey {
    RollKey::new("break")
        .packet(packet)
        .text(kind.as_str())
        .combatant(Some(target))
        .combatant(source)
        .clock(clock)
        .u32(applied)
}
