//! Validated catalog serving the core [`CatalogOracle`].
//!
//! Cross-references (bundles, song abilities, summon kinds named by effects)
//! are checked once at construction, so lookups at runtime only ever miss on
//! ids that were never declared.

use std::collections::BTreeMap;

use combat_core::{AbilitySpec, CatalogOracle, EffectSpec, SongSpec, SummonSpec};

/// Catalog validation failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("ability `{0}` is declared twice")]
    DuplicateAbility(String),

    #[error("summon kind `{0}` is declared twice")]
    DuplicateSummon(String),

    #[error("summon `{summon}` references unknown bundle `{bundle}`")]
    UnknownBundle { summon: String, bundle: String },

    #[error("bundle `{bundle}` references unknown ability `{ability}`")]
    UnknownBundleAbility { bundle: String, ability: String },

    #[error("song `{0}` has no matching ability")]
    SongWithoutAbility(String),

    #[error("song `{0}` has an empty group")]
    EmptySongGroup(String),

    #[error("ability `{ability}` summons unknown kind `{kind}`")]
    UnknownSummonKind { ability: String, kind: String },
}

/// Abilities, summons, maintained effects and bundles, cross-checked.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    abilities: BTreeMap<String, AbilitySpec>,
    summons: BTreeMap<String, SummonSpec>,
    songs: BTreeMap<String, SongSpec>,
    bundles: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn from_parts(
        abilities: Vec<AbilitySpec>,
        summons: Vec<SummonSpec>,
        songs: BTreeMap<String, SongSpec>,
        bundles: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            songs,
            bundles,
            ..Self::default()
        };
        for ability in abilities {
            if catalog.abilities.contains_key(&ability.id) {
                return Err(CatalogError::DuplicateAbility(ability.id));
            }
            catalog.abilities.insert(ability.id.clone(), ability);
        }
        for summon in summons {
            if catalog.summons.contains_key(&summon.kind) {
                return Err(CatalogError::DuplicateSummon(summon.kind));
            }
            catalog.summons.insert(summon.kind.clone(), summon);
        }
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (bundle, abilities) in &self.bundles {
            if let Some(missing) = abilities.iter().find(|id| !self.abilities.contains_key(*id)) {
                return Err(CatalogError::UnknownBundleAbility {
                    bundle: bundle.clone(),
                    ability: missing.clone(),
                });
            }
        }

        for summon in self.summons.values() {
            let bundles = summon
                .bundle
                .iter()
                .chain(summon.variants.values().filter_map(|v| v.bundle.as_ref()));
            for bundle in bundles {
                if !self.bundles.contains_key(bundle) {
                    return Err(CatalogError::UnknownBundle {
                        summon: summon.kind.clone(),
                        bundle: bundle.clone(),
                    });
                }
            }
        }

        for (ability, song) in &self.songs {
            if !self.abilities.contains_key(ability) {
                return Err(CatalogError::SongWithoutAbility(ability.clone()));
            }
            if song.group.is_empty() {
                return Err(CatalogError::EmptySongGroup(ability.clone()));
            }
        }

        for ability in self.abilities.values() {
            for effect in &ability.effects {
                if let EffectSpec::Summon { kind, .. } = effect {
                    if !self.summons.contains_key(kind) {
                        return Err(CatalogError::UnknownSummonKind {
                            ability: ability.id.clone(),
                            kind: kind.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn abilities(&self) -> impl Iterator<Item = &AbilitySpec> {
        self.abilities.values()
    }

    pub fn summons(&self) -> impl Iterator<Item = &SummonSpec> {
        self.summons.values()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

impl CatalogOracle for Catalog {
    fn ability(&self, id: &str) -> Option<&AbilitySpec> {
        self.abilities.get(id)
    }

    fn summon(&self, kind: &str) -> Option<&SummonSpec> {
        self.summons.get(kind)
    }

    fn song(&self, id: &str) -> Option<&SongSpec> {
        self.songs.get(id)
    }

    fn bundle(&self, id: &str) -> Option<&[String]> {
        self.bundles.get(id).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ability(id: &str) -> AbilitySpec {
        AbilitySpec {
            id: id.into(),
            name: id.into(),
            max_rank: 1,
            ..AbilitySpec::default()
        }
    }

    #[test]
    fn rejects_duplicate_abilities() {
        let result = Catalog::from_parts(
            vec![ability("bite"), ability("bite")],
            Vec::new(),
            BTreeMap::new(),
            BTreeMap::new(),
        );
        assert_eq!(result.err(), Some(CatalogError::DuplicateAbility("bite".into())));
    }

    #[test]
    fn rejects_dangling_bundle_references() {
        let summon = SummonSpec {
            kind: "wolf".into(),
            bundle: Some("wolf-kit".into()),
            ..SummonSpec::default()
        };
        let result = Catalog::from_parts(
            vec![ability("bite")],
            vec![summon.clone()],
            BTreeMap::new(),
            BTreeMap::new(),
        );
        assert!(matches!(result, Err(CatalogError::UnknownBundle { .. })));

        let bundles = BTreeMap::from([("wolf-kit".to_string(), vec!["howl".to_string()])]);
        let result = Catalog::from_parts(vec![ability("bite")], vec![summon], BTreeMap::new(), bundles);
        assert_eq!(
            result.err(),
            Some(CatalogError::UnknownBundleAbility {
                bundle: "wolf-kit".into(),
                ability: "howl".into(),
            })
        );
    }

    #[test]
    fn songs_need_an_ability_and_group() {
        let song = SongSpec {
            group: "march".into(),
            ..SongSpec::default()
        };
        let songs = BTreeMap::from([("war-march".to_string(), song)]);
        let result = Catalog::from_parts(Vec::new(), Vec::new(), songs.clone(), BTreeMap::new());
        assert_eq!(
            result.err(),
            Some(CatalogError::SongWithoutAbility("war-march".into()))
        );

        let catalog =
            Catalog::from_parts(vec![ability("war-march")], Vec::new(), songs, BTreeMap::new())
                .unwrap();
        assert!(catalog.song("war-march").is_some());
    }
}
