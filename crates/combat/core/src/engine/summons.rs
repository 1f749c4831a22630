//! Summon lifecycle, charm and pet management.

use crate::charm::{AllegianceSnapshot, CharmRecord, ReleaseReason, charm_rounds};
use crate::condition::{ConditionDuration, ConditionKind, ConditionMeta};
use crate::error::{FailureReason, RuleResult};
use crate::events::CombatEvent;
use crate::state::{
    AiConfig, AiMemory, AiMode, Allegiance, Combatant, CombatantId, KnownAbility,
    PetConfigChange,
};
use crate::summon::{Bond, CHARM_KIND, DespawnReason, SummonRecord, find_free_cell};

use super::CombatEngine;

impl CombatEngine<'_> {
    /// Spawns a summon of `kind` next to `owner`.
    ///
    /// A prior active summon of the same kind owned by `owner` is despawned
    /// first, so at most one is ever active per owner and kind.
    pub fn summon(
        &mut self,
        owner: CombatantId,
        kind: &str,
        variant: Option<&str>,
    ) -> RuleResult<CombatantId> {
        let catalog = self.env.catalog;
        let config = self.env.config;

        let owner_state = self.combatant(owner)?;
        if !owner_state.is_present() {
            return Err(FailureReason::CannotAct);
        }
        let spec = catalog.summon(kind).ok_or(FailureReason::CatalogNotFound)?;
        let (name, base, bundle) = spec.form(variant).ok_or(FailureReason::CatalogNotFound)?;
        let anchor = owner_state.position.ok_or(FailureReason::NoPlacement)?;
        let owner_level = owner_state.level;
        let allegiance = match owner_state.allegiance {
            Allegiance::Player => Allegiance::Ally,
            other => other,
        };

        let abilities = match bundle {
            Some(id) => catalog
                .bundle(id)
                .ok_or(FailureReason::CatalogNotFound)?
                .to_vec(),
            None => Vec::new(),
        };

        // The prior summon's cell counts as free: it leaves once a cell is found.
        let prior = self.state.roster.active_summon(owner, kind);
        let roster = &self.state.roster;
        let cell = find_free_cell(anchor, config.summons.placement_radius, |cell| {
            roster.is_occupied(cell, prior)
        })
        .ok_or(FailureReason::NoPlacement)?;

        if let Some(prior) = prior {
            self.despawn(prior, DespawnReason::Replaced)?;
        }

        let bond = Bond::compute(&spec.bond, &spec.flat, owner_level);
        let mut combatant = Combatant::new(name, allegiance, base.max_hp, base.max_mana)
            .with_level(owner_level)
            .with_role(base.role)
            .with_stats(base.stats)
            .with_owner(owner)
            .with_ai(spec.ai.clone())
            .at(cell);
        combatant.abilities = abilities
            .into_iter()
            .map(|id| KnownAbility { id, rank: 1 })
            .collect();
        combatant.bonuses.bond = bond.as_bonuses();
        bond.project_hp(&mut combatant.resources.hp, base.max_hp);
        combatant.summon = Some(SummonRecord {
            owner,
            kind: kind.to_owned(),
            active: true,
            expiry: spec
                .default_rounds
                .and_then(|rounds| self.state.clock.rounds_from_now(rounds)),
            source: spec.kind.clone(),
            variant: variant.map(str::to_owned),
            bond,
            base_max_hp: base.max_hp,
        });

        let id = self.state.spawn(combatant);
        self.emit(CombatEvent::SummonSpawned {
            owner,
            summon: id,
            kind: kind.to_owned(),
            position: cell,
        });
        Ok(id)
    }

    /// Takes a summon off the field. Its identity stays in the roster.
    ///
    /// Charmed combatants are released rather than despawned.
    pub fn despawn(&mut self, id: CombatantId, reason: DespawnReason) -> RuleResult<()> {
        let combatant = self.combatant(id)?;
        let record = combatant
            .summon
            .as_ref()
            .filter(|r| r.active)
            .ok_or(FailureReason::PrereqNotMet)?;
        if record.is_charm() {
            return self.release_charm(id, release_reason(reason));
        }
        let (owner, kind) = (record.owner, record.kind.clone());

        let combatant = self.combatant_mut(id)?;
        if let Some(record) = combatant.summon.as_mut() {
            record.active = false;
        }
        combatant.active = false;
        combatant.position = None;
        if let Some(songs) = combatant.songs.as_mut() {
            songs.clear();
        }
        combatant.bonuses.synergy = Default::default();
        self.forget_threat_on(id);

        self.emit(CombatEvent::SummonDespawned {
            owner,
            summon: id,
            kind,
            reason,
        });
        self.release_dependents(id)
    }

    /// Owner-initiated dismissal of the active summon of `kind`.
    pub fn dismiss(&mut self, owner: CombatantId, kind: &str) -> RuleResult<CombatantId> {
        let id = self
            .state
            .roster
            .active_summon(owner, kind)
            .ok_or(FailureReason::NotFound)?;
        self.despawn(id, DespawnReason::Dismissed)?;
        Ok(id)
    }

    /// Swaps a live summon into another form of its catalog entry.
    ///
    /// The combatant keeps its id, position and bond. HP is rescaled to the
    /// new maximum.
    pub fn swap_variant(&mut self, summon: CombatantId, variant: Option<&str>) -> RuleResult<()> {
        let catalog = self.env.catalog;
        let record = self
            .combatant(summon)?
            .summon
            .as_ref()
            .filter(|r| r.active && !r.is_charm())
            .ok_or(FailureReason::PrereqNotMet)?;
        let spec = catalog
            .summon(&record.source)
            .ok_or(FailureReason::CatalogNotFound)?;
        let (name, base, bundle) = spec.form(variant).ok_or(FailureReason::CatalogNotFound)?;
        let abilities = match bundle {
            Some(id) => Some(catalog.bundle(id).ok_or(FailureReason::CatalogNotFound)?.to_vec()),
            None => None,
        };

        let combatant = self.combatant_mut(summon)?;
        let bond = combatant.summon.as_ref().map(|r| r.bond).unwrap_or_default();
        combatant.name = name.to_owned();
        combatant.role = base.role;
        combatant.stats = base.stats;
        bond.project_hp(&mut combatant.resources.hp, base.max_hp);
        combatant.resources.mana.rescale_max(base.max_mana);
        if let Some(abilities) = abilities {
            combatant.abilities = abilities
                .into_iter()
                .map(|id| KnownAbility { id, rank: 1 })
                .collect();
        }
        if let Some(record) = combatant.summon.as_mut() {
            record.variant = variant.map(str::to_owned);
            record.base_max_hp = base.max_hp;
        }

        self.emit(CombatEvent::VariantSwapped {
            summon,
            variant: variant.map(str::to_owned),
        });
        Ok(())
    }

    /// Applies whitelisted behavior changes to a pet.
    pub fn configure_pet(
        &mut self,
        pet: CombatantId,
        changes: &[PetConfigChange],
    ) -> RuleResult<()> {
        let combatant = self.combatant_mut(pet)?;
        if combatant.owner.is_none() {
            return Err(FailureReason::PrereqNotMet);
        }
        let mut renamed = None;
        for change in changes {
            combatant.ai.apply(change);
            if let PetConfigChange::Nickname(nickname) = change {
                renamed = Some(nickname.clone());
            }
        }
        if let Some(nickname) = renamed {
            self.emit(CombatEvent::PetRenamed { pet, nickname });
        }
        Ok(())
    }

    pub fn rename_pet(&mut self, pet: CombatantId, nickname: Option<String>) -> RuleResult<()> {
        self.configure_pet(pet, &[PetConfigChange::Nickname(nickname)])
    }

    /// Flips a hostile combatant to `charmer`'s side for `rounds` rounds,
    /// extended by the charmer's mastery.
    ///
    /// A charmer holds at most one charm; the previous one is released.
    pub fn apply_charm(
        &mut self,
        charmer: CombatantId,
        target: CombatantId,
        rounds: u32,
    ) -> RuleResult<()> {
        let charmer_state = self.combatant(charmer)?;
        let charmer_allegiance = charmer_state.allegiance;
        let mastery = charmer_state.stats.mastery;
        let target_state = self
            .state
            .roster
            .get(target)
            .filter(|c| c.is_present())
            .ok_or(FailureReason::NoTarget)?;
        if !target_state.is_hostile()
            || !charmer_state.opposes(target_state)
            || target_state.charm.is_some()
            || target_state.summon.is_some()
        {
            return Err(FailureReason::PrereqNotMet);
        }

        let previous: Vec<CombatantId> = self
            .state
            .roster
            .iter()
            .filter(|c| c.charm.as_ref().map(|r| r.charmer == charmer).unwrap_or(false))
            .map(|c| c.id)
            .collect();
        for id in previous {
            self.release_charm(id, ReleaseReason::Replaced)?;
        }

        let duration = charm_rounds(rounds, mastery, self.env.config.breaks.charm_mastery_rounds);
        let clock = self.state.clock;
        let expiry = clock.rounds_from_now(duration);
        let allegiance = match charmer_allegiance {
            Allegiance::Player => Allegiance::Ally,
            other => other,
        };

        let combatant = self.combatant_mut(target)?;
        let max_hp = combatant.resources.hp.max;
        let snapshot = AllegianceSnapshot {
            allegiance: combatant.allegiance,
            owner: combatant.owner,
            ai: combatant.ai.clone(),
        };
        combatant.allegiance = allegiance;
        combatant.owner = Some(charmer);
        combatant.ai = AiConfig {
            mode: AiMode::Assist,
            ..AiConfig::default()
        };
        combatant.memory = AiMemory::default();
        combatant.charm = Some(CharmRecord {
            charmer,
            kind: CHARM_KIND.to_owned(),
            applied_round: clock.round,
            expiry,
            snapshot,
        });
        combatant.summon = Some(SummonRecord {
            owner: charmer,
            kind: CHARM_KIND.to_owned(),
            active: true,
            expiry,
            source: CHARM_KIND.to_owned(),
            variant: None,
            bond: Bond::default(),
            base_max_hp: max_hp,
        });
        combatant.conditions.set(
            ConditionKind::Charmed,
            true,
            Some(charmer),
            Some(ConditionDuration::Rounds(duration)),
            ConditionMeta::default(),
            &clock,
        );

        // Nobody keeps aggro on a combatant that changed sides.
        self.forget_threat_on(target);
        self.emit(CombatEvent::CharmApplied {
            charmer,
            target,
            until_round: expiry.map(|e| e.round),
        });
        self.emit(CombatEvent::ConditionApplied {
            target,
            kind: ConditionKind::Charmed,
            source: Some(charmer),
        });
        Ok(())
    }

    /// Restores a charmed combatant's pre-charm allegiance, owner and AI.
    pub fn release_charm(&mut self, target: CombatantId, reason: ReleaseReason) -> RuleResult<()> {
        let combatant = self.combatant_mut(target)?;
        let record = combatant.charm.take().ok_or(FailureReason::PrereqNotMet)?;
        let snapshot = record.snapshot;
        combatant.allegiance = snapshot.allegiance;
        combatant.owner = snapshot.owner;
        combatant.ai = snapshot.ai;
        combatant.memory = AiMemory::default();
        combatant.summon = None;
        if combatant.threat.is_none() && combatant.allegiance == Allegiance::Hostile {
            combatant.threat = Some(Default::default());
        }
        let was_charmed = combatant.conditions.clear(ConditionKind::Charmed);

        self.forget_threat_on(target);
        if was_charmed {
            self.emit(CombatEvent::ConditionCleared {
                target,
                kind: ConditionKind::Charmed,
            });
        }
        self.emit(CombatEvent::CharmReleased {
            charmer: record.charmer,
            target,
            reason,
        });
        Ok(())
    }

    /// Forces `hostile` onto `taunter` for `rounds` rounds.
    pub fn taunt(
        &mut self,
        hostile: CombatantId,
        taunter: CombatantId,
        rounds: u32,
    ) -> RuleResult<()> {
        if !self.combatant(taunter)?.is_present() {
            return Err(FailureReason::CannotAct);
        }
        let clock = self.state.clock;
        let expires = clock.rounds_from_now(rounds);
        let target = self
            .state
            .roster
            .get_mut(hostile)
            .filter(|c| c.is_present())
            .ok_or(FailureReason::NoTarget)?;
        let table = target.threat.as_mut().ok_or(FailureReason::NoTarget)?;
        table.apply_taunt(taunter, expires, "taunt", clock.now_ms);

        if let Some(taunter) = self.state.roster.get_mut(taunter) {
            taunter.memory.last_taunt = clock.at_round(clock.round);
        }
        self.emit(CombatEvent::TauntApplied {
            hostile,
            taunter,
            until_round: expires.map(|e| e.round),
        });
        Ok(())
    }

}

fn release_reason(reason: DespawnReason) -> ReleaseReason {
    match reason {
        DespawnReason::Expired => ReleaseReason::Expired,
        DespawnReason::Dismissed | DespawnReason::OwnerGone => ReleaseReason::Dismissed,
        DespawnReason::Replaced => ReleaseReason::Replaced,
        DespawnReason::Died => ReleaseReason::Died,
    }
}
