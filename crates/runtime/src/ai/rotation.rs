//! Fixed-priority cast rotation.
//!
//! Tiers are tried in order: heal, damage over time, debuff, direct damage,
//! then any other ability. Within a tier, higher catalog priority goes first
//! and ties break on the ability id so the order is deterministic.

use combat_core::config::AiTuning;
use combat_core::{AbilitySpec, AbilityTag, CatalogOracle, CombatState, CombatantId, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Heal,
    Dot,
    Debuff,
    Direct,
    Any,
}

/// Named rotation variants selectable through pet configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RotationProfile {
    #[default]
    Balanced,
    /// Skips the damage-over-time and debuff tiers.
    Burst,
}

impl RotationProfile {
    /// Unknown names fall back to the balanced rotation.
    pub fn from_config(name: Option<&str>) -> Self {
        name.and_then(|name| name.parse().ok()).unwrap_or_default()
    }

    fn allows(self, tier: Tier) -> bool {
        match self {
            RotationProfile::Balanced => true,
            RotationProfile::Burst => !matches!(tier, Tier::Dot | Tier::Debuff),
        }
    }
}

/// One cast the rotation would like to attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub tier: Tier,
    pub ability: String,
    pub target: CombatantId,
}

fn tier_of(spec: &AbilitySpec) -> Option<Tier> {
    if spec.has_tag(AbilityTag::Taunt) {
        // Taunting is decided separately, once per round.
        return None;
    }
    let tier = if spec.has_tag(AbilityTag::Heal) {
        Tier::Heal
    } else if spec.has_tag(AbilityTag::Dot) {
        Tier::Dot
    } else if spec.has_tag(AbilityTag::Debuff) {
        Tier::Debuff
    } else if spec.has_tag(AbilityTag::DirectDamage) {
        Tier::Direct
    } else {
        Tier::Any
    };
    Some(tier)
}

/// Lowest-health of the actor and its owner, when at or under the heal
/// threshold.
fn heal_target(state: &CombatState, actor: CombatantId, tuning: &AiTuning) -> Option<CombatantId> {
    let me = state.roster.get(actor)?;
    let owner = me
        .owner
        .and_then(|owner| state.roster.get(owner))
        .filter(|owner| owner.is_present());
    std::iter::once(me)
        .chain(owner)
        .filter(|c| c.resources.hp.percent() <= tuning.heal_threshold_percent)
        .min_by_key(|c| (c.resources.hp.percent(), c.id))
        .map(|c| c.id)
}

/// Ordered cast candidates for `actor` against `target`.
///
/// Cooldowns, mana and range are not checked here: the caller validates
/// each candidate and falls through on refusal.
pub fn candidates(
    state: &CombatState,
    catalog: &dyn CatalogOracle,
    actor: CombatantId,
    target: Option<CombatantId>,
    tuning: &AiTuning,
) -> Vec<Candidate> {
    let Some(me) = state.roster.get(actor) else {
        return Vec::new();
    };
    let profile = RotationProfile::from_config(me.ai.rotation_profile.as_deref());
    let clock = &state.clock;
    let heal = heal_target(state, actor, tuning);

    let mut known: Vec<&AbilitySpec> = me
        .abilities
        .iter()
        .filter_map(|known| catalog.ability(&known.id))
        .collect();
    known.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

    let mut out: Vec<Candidate> = known
        .into_iter()
        .filter_map(|spec| {
            let tier = tier_of(spec)?;
            if !profile.allows(tier) {
                return None;
            }
            let aimed = match tier {
                Tier::Heal => heal?,
                Tier::Dot | Tier::Debuff | Tier::Direct => target?,
                Tier::Any => match spec.target {
                    TargetKind::Enemy => target?,
                    TargetKind::Ally | TargetKind::Caster => actor,
                },
            };
            let guard = match tier {
                Tier::Dot => tuning.dot_reuse_rounds,
                Tier::Debuff => tuning.debuff_reuse_rounds,
                _ => 0,
            };
            if guard > 0 && me.memory.recently_used(&spec.id, aimed, guard, clock) {
                return None;
            }
            Some(Candidate {
                tier,
                ability: spec.id.clone(),
                target: aimed,
            })
        })
        .collect();
    out.sort_by_key(|candidate| candidate.tier);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{
        AiConfig, Allegiance, CombatClock, Combatant, EncounterId, MemoryCatalog, Position,
    };

    fn spec(id: &str, tags: &[AbilityTag], target: TargetKind, priority: i32) -> AbilitySpec {
        AbilitySpec {
            id: id.into(),
            target,
            range: 6,
            tags: tags.to_vec(),
            priority,
            max_rank: 1,
            ..AbilitySpec::default()
        }
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::default()
            .with_ability(spec("mend", &[AbilityTag::Heal], TargetKind::Ally, 0))
            .with_ability(spec("venom", &[AbilityTag::Dot], TargetKind::Enemy, 0))
            .with_ability(spec("ensnare", &[AbilityTag::Debuff], TargetKind::Enemy, 0))
            .with_ability(spec("firebolt", &[AbilityTag::DirectDamage], TargetKind::Enemy, 1))
            .with_ability(spec("spark", &[AbilityTag::DirectDamage], TargetKind::Enemy, 5))
            .with_ability(spec("bark-skin", &[], TargetKind::Caster, 0))
            .with_ability(spec("challenge", &[AbilityTag::Taunt], TargetKind::Enemy, 9))
    }

    fn setup() -> (CombatState, CombatantId, CombatantId, CombatantId) {
        let mut state = CombatState::new();
        let owner = state.spawn(Combatant::new("owner", Allegiance::Player, 100, 0).at(Position::new(0, 0)));
        let mut pet = Combatant::new("sprite", Allegiance::Player, 100, 100)
            .at(Position::new(1, 0))
            .with_owner(owner)
            .with_ai(AiConfig::default());
        for id in ["mend", "venom", "ensnare", "firebolt", "spark", "bark-skin", "challenge"] {
            pet = pet.with_ability(id);
        }
        let pet = state.spawn(pet);
        let foe = state.spawn(Combatant::new("foe", Allegiance::Hostile, 100, 0).at(Position::new(4, 0)));
        state.clock = CombatClock::in_encounter(EncounterId(1), 1, 0);
        (state, owner, pet, foe)
    }

    fn abilities(list: &[Candidate]) -> Vec<&str> {
        list.iter().map(|c| c.ability.as_str()).collect()
    }

    #[test]
    fn tiers_follow_fixed_priority() {
        let (state, _, pet, foe) = setup();
        let list = candidates(&state, &catalog(), pet, Some(foe), &AiTuning::default());
        assert_eq!(
            abilities(&list),
            vec!["venom", "ensnare", "spark", "firebolt", "bark-skin"]
        );
        assert!(list.iter().all(|c| c.ability != "challenge"));
    }

    #[test]
    fn heal_targets_the_wounded_owner() {
        let (mut state, owner, pet, foe) = setup();
        if let Some(owner) = state.roster.get_mut(owner) {
            owner.resources.hp.current = 40;
        }
        let list = candidates(&state, &catalog(), pet, Some(foe), &AiTuning::default());
        assert_eq!(list[0].ability, "mend");
        assert_eq!(list[0].target, owner);
    }

    #[test]
    fn reuse_guard_skips_recent_dot() {
        let (mut state, _, pet, foe) = setup();
        let clock = state.clock;
        if let Some(pet) = state.roster.get_mut(pet) {
            pet.memory.record_use("venom", foe, &clock);
        }
        let list = candidates(&state, &catalog(), pet, Some(foe), &AiTuning::default());
        assert_eq!(list[0].ability, "ensnare");

        state.clock = CombatClock::in_encounter(EncounterId(1), 4, 0);
        let list = candidates(&state, &catalog(), pet, Some(foe), &AiTuning::default());
        assert_eq!(list[0].ability, "venom");
    }

    #[test]
    fn burst_profile_skips_dot_and_debuff() {
        let (mut state, _, pet, foe) = setup();
        if let Some(pet) = state.roster.get_mut(pet) {
            pet.ai.rotation_profile = Some("burst".into());
        }
        let list = candidates(&state, &catalog(), pet, Some(foe), &AiTuning::default());
        assert_eq!(abilities(&list), vec!["spark", "firebolt", "bark-skin"]);
    }

    #[test]
    fn no_target_leaves_self_casts() {
        let (state, _, pet, _) = setup();
        let list = candidates(&state, &catalog(), pet, None, &AiTuning::default());
        assert_eq!(abilities(&list), vec!["bark-skin"]);
    }
}
