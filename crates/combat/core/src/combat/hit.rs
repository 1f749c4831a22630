//! Hit chance for melee swings.

use crate::config::HitConfig;

/// Calculate hit chance based on attack vs armor.
///
/// # Formula
///
/// ```text
/// hit_chance = base + (attack - armor)
/// clamped to [min, max]
/// ```
pub fn calculate_hit_chance(attack: i32, armor: i32, params: &HitConfig) -> u32 {
    let hit_chance = params.base_percent + (attack - armor);
    hit_chance.clamp(params.min_percent, params.max_percent).max(0) as u32
}
