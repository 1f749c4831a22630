//! Combatant aggregate.
//!
//! Every per-combatant ledger lives on the combatant that owns it. Mutation
//! goes through engine operations; the fields are public for reads and
//! setup.

use crate::charm::CharmRecord;
use crate::combat::Defenses;
use crate::condition::{ConditionLedger, PassiveEffect};
use crate::cooldown::CooldownMap;
use crate::song::SongBook;
use crate::state::{
    AiConfig, AiMemory, BonusLayers, CombatBonuses, CombatStats, CombatantId, Position,
    Resources, Role,
};
use crate::summon::SummonRecord;
use crate::threat::ThreatTable;

/// Which side a combatant fights on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Allegiance {
    Player,
    Ally,
    Hostile,
    Neutral,
}

impl Allegiance {
    pub const fn is_friendly(self) -> bool {
        matches!(self, Allegiance::Player | Allegiance::Ally)
    }

    /// Friendly and hostile sides oppose each other; neutrals oppose no one.
    pub const fn opposes(self, other: Allegiance) -> bool {
        match (self, other) {
            (Allegiance::Hostile, other) => other.is_friendly(),
            (this, Allegiance::Hostile) => this.is_friendly(),
            _ => false,
        }
    }
}

/// An ability known by a combatant, with its current rank.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnownAbility {
    pub id: String,
    pub rank: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub allegiance: Allegiance,
    /// Declared owner (pets, summons, charmed combatants).
    pub owner: Option<CombatantId>,
    pub level: u32,
    pub role: Role,
    /// `None` while off the grid.
    pub position: Option<Position>,
    /// Leash anchor for combatants without an owner.
    pub home: Option<Position>,
    /// False once defeated or despawned. Identity is never deleted.
    pub active: bool,
    pub resources: Resources,
    pub stats: CombatStats,
    pub bonuses: BonusLayers,
    pub defenses: Defenses,
    pub conditions: ConditionLedger,
    pub passives: Vec<PassiveEffect>,
    pub cooldowns: CooldownMap,
    pub abilities: Vec<KnownAbility>,
    /// Present on hostiles.
    pub threat: Option<ThreatTable>,
    pub summon: Option<SummonRecord>,
    pub charm: Option<CharmRecord>,
    pub songs: Option<SongBook>,
    pub ai: AiConfig,
    pub memory: AiMemory,
}

impl Combatant {
    /// A fresh combatant with full pools. Hostiles get a threat table.
    pub fn new(name: impl Into<String>, allegiance: Allegiance, hp: u32, mana: u32) -> Self {
        Self {
            id: CombatantId::default(),
            name: name.into(),
            allegiance,
            owner: None,
            level: 1,
            role: Role::default(),
            position: None,
            home: None,
            active: true,
            resources: Resources::full(hp, mana),
            stats: CombatStats::default(),
            bonuses: BonusLayers::default(),
            defenses: Defenses::default(),
            conditions: ConditionLedger::new(),
            passives: Vec::new(),
            cooldowns: CooldownMap::new(),
            abilities: Vec::new(),
            threat: (allegiance == Allegiance::Hostile).then(ThreatTable::new),
            summon: None,
            charm: None,
            songs: None,
            ai: AiConfig::default(),
            memory: AiMemory::default(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        if self.home.is_none() {
            self.home = Some(position);
        }
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_owner(mut self, owner: CombatantId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_ai(mut self, ai: AiConfig) -> Self {
        self.ai = ai;
        self
    }

    pub fn with_defenses(mut self, defenses: Defenses) -> Self {
        self.defenses = defenses;
        self
    }

    pub fn with_ability(mut self, id: impl Into<String>) -> Self {
        self.abilities.push(KnownAbility {
            id: id.into(),
            rank: 1,
        });
        self
    }

    /// Enables the maintained-effect scheduler for this combatant.
    pub fn performer(mut self) -> Self {
        self.songs = Some(SongBook::new());
        self
    }

    /// Alive, active, and on the grid.
    pub fn is_present(&self) -> bool {
        self.active && self.position.is_some() && !self.resources.hp.is_empty()
    }

    pub fn is_hostile(&self) -> bool {
        self.allegiance == Allegiance::Hostile
    }

    pub fn opposes(&self, other: &Combatant) -> bool {
        self.allegiance.opposes(other.allegiance)
    }

    pub fn rank_of(&self, ability: &str) -> Option<u32> {
        self.abilities
            .iter()
            .find(|known| known.id == ability)
            .map(|known| known.rank)
    }

    pub fn knows(&self, ability: &str) -> bool {
        self.rank_of(ability).is_some()
    }

    pub fn effective_bonuses(&self) -> CombatBonuses {
        self.bonuses.total()
    }

    pub fn display_name(&self) -> &str {
        self.ai.nickname.as_deref().unwrap_or(&self.name)
    }
}
