use crate::charm::ReleaseReason;
use crate::combat::{
    DamagePacket, DamageRequest, PhaseFault, break_key, charm_break_chance, mez_break_chance,
    pipeline,
};
use crate::condition::ConditionKind;
use crate::error::{FailureReason, RuleResult};
use crate::events::CombatEvent;
use crate::state::{CombatantId, PacketId, Role};
use crate::summon::DespawnReason;

use super::CombatEngine;

/// Whether the pipeline result is written back to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageOptions {
    /// `false` resolves the packet as a preview: no HP, ward, break or
    /// threat changes.
    pub commit: bool,
}

impl Default for DamageOptions {
    fn default() -> Self {
        Self { commit: true }
    }
}

impl DamageOptions {
    pub const fn preview() -> Self {
        Self { commit: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DamageOutcome {
    pub packet: PacketId,
    pub source: Option<CombatantId>,
    pub target: CombatantId,
    pub incoming: u32,
    pub resisted: u32,
    pub mitigated: u32,
    pub absorbed: u32,
    pub applied: u32,
    pub committed: bool,
    pub defeated: bool,
    /// Conditions broken by this packet.
    pub broke: Vec<ConditionKind>,
    pub faults: Vec<PhaseFault>,
}

impl CombatEngine<'_> {
    /// Resolves one damage packet against its target.
    ///
    /// The packet is stamped with a fresh id and run through the resist,
    /// mitigate and absorb phases. On commit the applied total drains HP,
    /// ward spend is persisted, break checks roll once each and threat is
    /// credited to the source.
    pub fn apply_damage(
        &mut self,
        request: DamageRequest,
        options: DamageOptions,
    ) -> RuleResult<DamageOutcome> {
        let target_id = request.target;
        let target = self.combatant(target_id)?;
        if !target.active {
            return Err(FailureReason::NoTarget);
        }

        let packet = request.stamp(self.state.next_packet_id());
        let workflow = {
            let defenses = &self.combatant(target_id)?.defenses;
            pipeline::resolve(packet, defenses, self.env.config, self.env.hooks)
        };
        let packet = workflow.packet().clone();
        let applied = workflow.applied();

        for fault in &workflow.faults {
            self.emit(CombatEvent::PhaseFaulted {
                packet: packet.id(),
                fault: fault.clone(),
            });
        }

        let mut outcome = DamageOutcome {
            packet: packet.id(),
            source: packet.source(),
            target: target_id,
            incoming: workflow.incoming,
            resisted: workflow.resisted,
            mitigated: workflow.mitigated,
            absorbed: workflow.absorbed,
            applied,
            committed: options.commit,
            defeated: false,
            broke: Vec::new(),
            faults: workflow.faults.clone(),
        };

        if options.commit {
            let target = self.combatant_mut(target_id)?;
            target.resources.hp.drain(applied);
            for (ward, spent) in target
                .defenses
                .wards
                .iter_mut()
                .zip(workflow.ward_spend.iter())
            {
                ward.remaining = ward.remaining.saturating_sub(*spent);
            }
            target.defenses.prune_wards();
        }

        self.emit(CombatEvent::DamageResolved {
            packet: outcome.packet,
            source: outcome.source,
            target: target_id,
            incoming: outcome.incoming,
            resisted: outcome.resisted,
            mitigated: outcome.mitigated,
            absorbed: outcome.absorbed,
            applied,
            committed: options.commit,
        });

        if !options.commit || applied == 0 {
            return Ok(outcome);
        }

        outcome.broke = self.roll_breaks(&packet, applied)?;
        self.credit_threat(&packet, applied);

        if self.combatant(target_id)?.resources.hp.is_empty() {
            self.defeat(target_id)?;
            outcome.defeated = true;
        }
        Ok(outcome)
    }

    /// One break check per breakable condition on the target.
    fn roll_breaks(
        &mut self,
        packet: &DamagePacket,
        applied: u32,
    ) -> RuleResult<Vec<ConditionKind>> {
        let clock = self.state.clock;
        let breaks = self.env.config.breaks;
        let target_id = packet.target();
        let mut broke = Vec::new();

        let target = self.combatant(target_id)?;
        let mez = target.conditions.get(ConditionKind::Mesmerized);
        if mez.active {
            let chance = mez_break_chance(&mez.meta, &breaks);
            let key = break_key(
                packet.id(),
                ConditionKind::Mesmerized,
                target_id,
                packet.source(),
                &clock,
                applied,
            );
            let broken = self.env.roll.passes(&key, chance);
            self.emit(CombatEvent::BreakRolled {
                packet: packet.id(),
                target: target_id,
                kind: ConditionKind::Mesmerized,
                chance,
                broken,
            });
            if broken {
                self.combatant_mut(target_id)?
                    .conditions
                    .clear(ConditionKind::Mesmerized);
                self.emit(CombatEvent::ConditionCleared {
                    target: target_id,
                    kind: ConditionKind::Mesmerized,
                });
                broke.push(ConditionKind::Mesmerized);
            }
        }

        let target = self.combatant(target_id)?;
        let charmer = target
            .charm
            .as_ref()
            .filter(|_| target.conditions.is_active(ConditionKind::Charmed))
            .map(|record| record.charmer);
        if let Some(charmer) = charmer {
            let mastery = self
                .state
                .roster
                .get(charmer)
                .map(|c| c.stats.mastery)
                .unwrap_or(0);
            let chance = charm_break_chance(applied, mastery, &breaks);
            let key = break_key(
                packet.id(),
                ConditionKind::Charmed,
                target_id,
                packet.source(),
                &clock,
                applied,
            );
            let broken = self.env.roll.passes(&key, chance);
            self.emit(CombatEvent::BreakRolled {
                packet: packet.id(),
                target: target_id,
                kind: ConditionKind::Charmed,
                chance,
                broken,
            });
            if broken {
                self.release_charm(target_id, ReleaseReason::Broken)?;
                broke.push(ConditionKind::Charmed);
            }
        }

        Ok(broke)
    }

    /// Credits `applied` (scaled by the source's role) to a hostile
    /// target's threat table.
    fn credit_threat(&mut self, packet: &DamagePacket, applied: u32) {
        let Some(source) = packet.source() else {
            return;
        };
        if source == packet.target() {
            return;
        }
        let threat = self.env.config.threat;
        let multiplier = match self.state.roster.get(source).map(|c| c.role) {
            Some(Role::Tank) => threat.tank_multiplier_percent,
            _ => threat.default_multiplier_percent,
        };
        let amount = u64::from(applied) * u64::from(multiplier) / 100;
        let now_ms = self.state.clock.now_ms;

        let Some(target) = self.state.roster.get_mut(packet.target()) else {
            return;
        };
        if !target.is_hostile() {
            return;
        }
        let Some(table) = target.threat.as_mut() else {
            return;
        };
        table.add_threat(source, amount, now_ms);
        self.emit(CombatEvent::ThreatAdded {
            hostile: packet.target(),
            attacker: source,
            amount,
        });
    }

    /// Takes a combatant at 0 HP out of the fight.
    ///
    /// Summons despawn, charmed combatants are released first, and anything
    /// the defeated combatant owned or charmed goes with it.
    pub(crate) fn defeat(&mut self, id: CombatantId) -> RuleResult<()> {
        self.emit(CombatEvent::Defeated { target: id });

        let is_summon = self
            .combatant(id)?
            .summon
            .as_ref()
            .map(|record| record.active && !record.is_charm())
            .unwrap_or(false);
        if is_summon {
            self.despawn(id, DespawnReason::Died)?;
        } else {
            if self.combatant(id)?.charm.is_some() {
                self.release_charm(id, ReleaseReason::Died)?;
            }
            let combatant = self.combatant_mut(id)?;
            combatant.active = false;
            combatant.position = None;
            if let Some(songs) = combatant.songs.as_mut() {
                songs.clear();
            }
            combatant.bonuses.synergy = Default::default();
            self.forget_threat_on(id);
        }

        self.release_dependents(id)
    }

    /// Despawns summons owned by `owner` and releases combatants it charmed.
    pub(crate) fn release_dependents(&mut self, owner: CombatantId) -> RuleResult<()> {
        let charmed: Vec<CombatantId> = self
            .state
            .roster
            .iter()
            .filter(|c| c.charm.as_ref().map(|r| r.charmer == owner).unwrap_or(false))
            .map(|c| c.id)
            .collect();
        for id in charmed {
            self.release_charm(id, ReleaseReason::Died)?;
        }

        let summons: Vec<CombatantId> = self
            .state
            .roster
            .iter()
            .filter(|c| {
                c.summon
                    .as_ref()
                    .map(|r| r.active && r.owner == owner)
                    .unwrap_or(false)
            })
            .map(|c| c.id)
            .collect();
        for id in summons {
            self.despawn(id, DespawnReason::OwnerGone)?;
        }
        Ok(())
    }
}
