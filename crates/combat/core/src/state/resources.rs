//! Resource pools and combat stats.

// ============================================================================
// Resource Pools
// ============================================================================

/// Enum representing individual resource types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResourceKind {
    Hp,
    Mana,
}

/// Current/maximum pair. `current` never exceeds `max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePool {
    pub current: u32,
    pub max: u32,
}

impl ResourcePool {
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub const fn new(current: u32, max: u32) -> Self {
        let current = if current > max { max } else { current };
        Self { current, max }
    }

    pub const fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Current as a percentage of max. An empty pool with zero max reads 0.
    pub fn percent(&self) -> u32 {
        if self.max == 0 {
            return 0;
        }
        ((u64::from(self.current) * 100) / u64::from(self.max)) as u32
    }

    /// Removes up to `amount`. Returns what was actually removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.current);
        self.current -= removed;
        removed
    }

    /// Adds up to `amount`, capped at max. Returns what was actually added.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.max - self.current);
        self.current += added;
        added
    }

    /// Spends exactly `amount` or nothing.
    pub fn try_spend(&mut self, amount: u32) -> bool {
        if self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }

    /// Changes the maximum, scaling current proportionally.
    ///
    /// Current never drops below its prior value unless that exceeds the new
    /// maximum.
    pub fn rescale_max(&mut self, new_max: u32) {
        let scaled = if self.max == 0 {
            new_max
        } else {
            ((u64::from(self.current) * u64::from(new_max)) / u64::from(self.max)) as u32
        };
        self.current = scaled.max(self.current).min(new_max);
        self.max = new_max;
    }
}

/// HP and mana of one combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resources {
    pub hp: ResourcePool,
    pub mana: ResourcePool,
}

impl Resources {
    pub const fn full(hp: u32, mana: u32) -> Self {
        Self {
            hp: ResourcePool::full(hp),
            mana: ResourcePool::full(mana),
        }
    }

    pub fn pool_mut(&mut self, kind: ResourceKind) -> &mut ResourcePool {
        match kind {
            ResourceKind::Hp => &mut self.hp,
            ResourceKind::Mana => &mut self.mana,
        }
    }
}

// ============================================================================
// Stats & Bonuses
// ============================================================================

/// Base combat stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatStats {
    /// Added to hit chance.
    pub attack: i32,
    /// Subtracted from attackers' hit chance.
    pub armor: i32,
    /// Melee damage per swing.
    pub damage: u32,
    pub haste_percent: u32,
    /// Charm strength: extends charm duration, reduces break chance.
    pub mastery: u32,
}

/// Additive combat bonuses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatBonuses {
    pub attack: i32,
    pub damage: i32,
    pub armor: i32,
    pub max_hp: i32,
}

impl core::ops::Add for CombatBonuses {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            attack: self.attack + rhs.attack,
            damage: self.damage + rhs.damage,
            armor: self.armor + rhs.armor,
            max_hp: self.max_hp + rhs.max_hp,
        }
    }
}

/// Bonus sources tracked separately so each can be recomputed alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusLayers {
    /// Summon bond.
    pub bond: CombatBonuses,
    /// Maintained-effect synergy.
    pub synergy: CombatBonuses,
}

impl BonusLayers {
    pub fn total(&self) -> CombatBonuses {
        self.bond + self.synergy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_drain_and_restore_clamp() {
        let mut pool = ResourcePool::new(30, 50);
        assert_eq!(pool.drain(45), 30);
        assert!(pool.is_empty());
        assert_eq!(pool.restore(80), 50);
        assert_eq!(pool.current, 50);
    }

    #[test]
    fn rescale_keeps_proportion_without_reducing() {
        let mut pool = ResourcePool::full(200);
        pool.rescale_max(265);
        assert_eq!(pool, ResourcePool::new(265, 265));

        let mut half = ResourcePool::new(100, 200);
        half.rescale_max(265);
        assert_eq!(half.current, 132);

        let mut shrink = ResourcePool::new(150, 200);
        shrink.rescale_max(120);
        assert_eq!(shrink.current, 120);
    }
}
