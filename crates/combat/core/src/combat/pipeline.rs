//! Damage pipeline phases.
//!
//! ```text
//! BeforeResist → resist → AfterResist → mitigate → AfterMitigate → absorb → AfterAbsorb
//! ```
//!
//! Phases run strictly in order and only shrink amounts. The pipeline never
//! touches combatant state; committing HP loss and ward spend is the
//! engine's job.

use super::checkpoint::{Checkpoint, DamageHooks};
use super::packet::{DamageCategory, DamagePacket};
use super::ward::Defenses;
use super::workflow::{Bucket, DamageWorkflow};
use crate::config::CombatConfig;

/// Runs every phase and checkpoint for `packet` against `defenses`.
pub fn resolve(
    packet: DamagePacket,
    defenses: &Defenses,
    config: &CombatConfig,
    hooks: &DamageHooks,
) -> DamageWorkflow {
    let mut workflow = DamageWorkflow::new(packet, defenses.wards.len());

    hooks.run(Checkpoint::BeforeResist, &mut workflow);
    resist(&mut workflow, defenses, config);
    hooks.run(Checkpoint::AfterResist, &mut workflow);
    mitigate(&mut workflow, defenses, config);
    hooks.run(Checkpoint::AfterMitigate, &mut workflow);
    absorb(&mut workflow, defenses, config);
    hooks.run(Checkpoint::AfterAbsorb, &mut workflow);

    workflow
}

/// Elemental parts lose `resist%` (capped) of their amount.
pub fn resist(workflow: &mut DamageWorkflow, defenses: &Defenses, config: &CombatConfig) {
    let cap = config.mitigation.resist_cap_percent.min(100);
    let parts = workflow.packet().parts().to_vec();
    for (index, part) in parts.iter().enumerate() {
        if !part.kind.is_elemental() {
            continue;
        }
        let percent = defenses.resist(part.kind).min(cap);
        let amount = workflow.remaining()[index];
        let reduction = percent_of(amount, percent);
        workflow.reduce(index, reduction, Bucket::Resisted);
    }
}

/// Per category: subtract the flat value across the category's parts in
/// order, then remove `percent%` (capped) of each part.
pub fn mitigate(workflow: &mut DamageWorkflow, defenses: &Defenses, config: &CombatConfig) {
    let cap = config.mitigation.mitigation_cap_percent.min(100);
    let parts = workflow.packet().parts().to_vec();

    for category in [DamageCategory::Physical, DamageCategory::Spell] {
        let mitigation = defenses.mitigation(category);
        let mut flat_left = mitigation.flat;
        let percent = mitigation.percent.min(cap);

        for (index, part) in parts.iter().enumerate() {
            if part.category != category {
                continue;
            }
            if flat_left > 0 {
                flat_left -= workflow.reduce(index, flat_left, Bucket::Mitigated);
            }
            let amount = workflow.remaining()[index];
            workflow.reduce(index, percent_of(amount, percent), Bucket::Mitigated);
        }
    }
}

/// Wards soak matching parts in descending priority.
pub fn absorb(workflow: &mut DamageWorkflow, defenses: &Defenses, config: &CombatConfig) {
    let parts = workflow.packet().parts().to_vec();
    for ward_index in defenses.soak_order(config.wards.tie_break) {
        let ward = &defenses.wards[ward_index];
        for (index, part) in parts.iter().enumerate() {
            let capacity = ward.remaining - workflow.ward_spend[ward_index];
            if capacity == 0 {
                break;
            }
            if !ward.filter.matches(part) {
                continue;
            }
            let soaked = workflow.reduce(index, capacity, Bucket::Absorbed);
            workflow.ward_spend[ward_index] = workflow.ward_spend[ward_index].saturating_add(soaked);
        }
    }
}

fn percent_of(amount: u32, percent: u32) -> u32 {
    ((u64::from(amount) * u64::from(percent)) / 100) as u32
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::combat::checkpoint::{CheckpointContext, DamageHook, FaultKind, HookError};
    use crate::combat::packet::{DamageRequest, DamageType};
    use crate::combat::ward::{Mitigation, Ward, WardFilter};
    use crate::state::{CombatantId, PacketId};

    fn packet() -> DamagePacket {
        DamageRequest::new(CombatantId(2))
            .from(CombatantId(1))
            .physical(100)
            .part(DamageType::Fire, DamageCategory::Spell, 80)
            .part(DamageType::Cold, DamageCategory::Spell, 40)
            .stamp(PacketId(1))
    }

    fn defenses() -> Defenses {
        let mut defenses = Defenses {
            physical: Mitigation {
                flat: 10,
                percent: 20,
            },
            spell: Mitigation {
                flat: 5,
                percent: 95,
            },
            ..Defenses::default()
        };
        defenses.resists.insert(DamageType::Fire, 50);
        defenses.resists.insert(DamageType::Cold, 90);
        defenses.add_ward(Ward {
            id: "stoneskin".into(),
            remaining: 25,
            priority: 1,
            filter: WardFilter {
                category: Some(DamageCategory::Physical),
                ..WardFilter::default()
            },
        });
        defenses
    }

    fn assert_conserved(workflow: &DamageWorkflow) {
        assert_eq!(
            workflow.resisted + workflow.mitigated + workflow.absorbed + workflow.applied(),
            workflow.incoming
        );
    }

    #[test]
    fn phases_shrink_in_order_and_conserve() {
        let config = CombatConfig::default();
        let workflow = resolve(packet(), &defenses(), &config, &DamageHooks::empty());

        assert_eq!(workflow.incoming, 220);
        // fire 80 → 40 (50%), cold 40 → 10 (capped at 75%)
        assert_eq!(workflow.resisted, 70);
        // physical: 100 - 10 = 90, -20% → 72. spell: fire 40 - 5 = 35 → 35 - 31 = 4,
        // cold 10 → 10 - 9 = 1 (capped at 90%)
        assert_eq!(workflow.mitigated, 28 + 36 + 9);
        // stoneskin soaks 25 of the physical 72
        assert_eq!(workflow.remaining(), &[47, 4, 1]);
        assert_eq!(workflow.absorbed, 25);
        assert_eq!(workflow.applied(), 47 + 4 + 1);
        assert_eq!(workflow.ward_spend[0], 25);
        assert_conserved(&workflow);
    }

    struct Greedy;

    impl DamageHook for Greedy {
        fn name(&self) -> &'static str {
            "greedy"
        }

        fn on_checkpoint(&self, ctx: &mut CheckpointContext<'_>) -> Result<(), HookError> {
            if let Some(first) = ctx.amounts.first_mut() {
                *first += 1_000;
            }
            Ok(())
        }
    }

    struct Halver;

    impl DamageHook for Halver {
        fn name(&self) -> &'static str {
            "halver"
        }

        fn priority(&self) -> i32 {
            -5
        }

        fn on_checkpoint(&self, ctx: &mut CheckpointContext<'_>) -> Result<(), HookError> {
            if ctx.checkpoint == Checkpoint::AfterMitigate {
                for amount in ctx.amounts.iter_mut() {
                    *amount /= 2;
                }
            }
            Ok(())
        }
    }

    struct Broken;

    impl DamageHook for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn on_checkpoint(&self, ctx: &mut CheckpointContext<'_>) -> Result<(), HookError> {
            for amount in ctx.amounts.iter_mut() {
                *amount = 0;
            }
            Err(HookError::Failed("lookup failed".into()))
        }
    }

    #[test]
    fn hooks_may_only_shrink() {
        let config = CombatConfig::default();
        let hooks = DamageHooks::new(vec![
            Arc::new(Greedy) as Arc<dyn DamageHook>,
            Arc::new(Halver) as Arc<dyn DamageHook>,
            Arc::new(Broken) as Arc<dyn DamageHook>,
        ]);
        let plain = resolve(packet(), &Defenses::default(), &config, &DamageHooks::empty());
        let hooked = resolve(packet(), &Defenses::default(), &config, &hooks);

        // Greedy and Broken are reverted at all four checkpoints.
        assert_eq!(hooked.faults.len(), 8);
        assert!(hooked.faults.iter().any(|f| f.kind == FaultKind::Grew));
        assert!(hooked
            .faults
            .iter()
            .any(|f| matches!(f.kind, FaultKind::Failed(_)) && f.hook == "broken"));

        // Halver runs first and is kept.
        assert_eq!(hooked.applied(), plain.applied() / 2);
        assert_eq!(hooked.mitigated, plain.applied() - plain.applied() / 2);
        assert_conserved(&hooked);
    }
}
