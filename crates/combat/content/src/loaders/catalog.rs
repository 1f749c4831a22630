//! Ability, summon and song catalog loaders.

use std::collections::BTreeMap;
use std::path::Path;

use combat_core::{AbilitySpec, SongSpec, SummonSpec};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::loaders::{LoadResult, read_file};

/// Ability catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityCatalog {
    pub abilities: Vec<AbilitySpec>,
}

/// Summon catalog structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonCatalog {
    pub summons: Vec<SummonSpec>,
    /// Bundle id → ability ids granted to a summon.
    pub bundles: BTreeMap<String, Vec<String>>,
}

/// Maintained-effect catalog structure for RON files, keyed by ability id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SongCatalog {
    pub songs: BTreeMap<String, SongSpec>,
}

/// Loader for catalogs from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    pub fn parse_abilities(content: &str) -> LoadResult<AbilityCatalog> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability catalog RON: {}", e))
    }

    pub fn parse_summons(content: &str) -> LoadResult<SummonCatalog> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse summon catalog RON: {}", e))
    }

    pub fn parse_songs(content: &str) -> LoadResult<SongCatalog> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse song catalog RON: {}", e))
    }

    /// Parses and cross-validates the three catalog documents.
    pub fn parse(abilities: &str, summons: &str, songs: &str) -> LoadResult<Catalog> {
        let abilities = Self::parse_abilities(abilities)?;
        let summons = Self::parse_summons(summons)?;
        let songs = Self::parse_songs(songs)?;
        let catalog = Catalog::from_parts(
            abilities.abilities,
            summons.summons,
            songs.songs,
            summons.bundles,
        )?;
        Ok(catalog)
    }

    /// Load a catalog from `abilities.ron`, `summons.ron` and `songs.ron`
    /// under `dir`.
    pub fn load(dir: &Path) -> LoadResult<Catalog> {
        let abilities = read_file(&dir.join("abilities.ron"))?;
        let summons = read_file(&dir.join("summons.ron"))?;
        let songs = read_file(&dir.join("songs.ron"))?;
        Self::parse(&abilities, &summons, &songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{AbilityTag, CatalogOracle, EffectSpec};

    #[test]
    fn parses_effect_variants() {
        let catalog = CatalogLoader::parse_abilities(
            r#"(
                abilities: [
                    (
                        id: "venom",
                        name: "Venom",
                        target: Enemy,
                        range: 4,
                        tags: [Dot],
                        max_rank: 2,
                        effects: [
                            Damage(kind: poison, category: spell, amount: (base: 8, per_rank: 4)),
                            ApplyCondition(kind: slowed, rounds: Some(2), meta: (slow_percent: Some(30))),
                        ],
                    ),
                ],
            )"#,
        )
        .unwrap();
        let venom = &catalog.abilities[0];
        assert!(venom.has_tag(AbilityTag::Dot));
        assert_eq!(venom.effects.len(), 2);
        assert!(matches!(venom.effects[0], EffectSpec::Damage { .. }));
    }

    #[test]
    fn unknown_effect_kinds_fail_to_load() {
        let result = CatalogLoader::parse_abilities(
            r#"(abilities: [(id: "x", effects: [Teleport(range: 3)])])"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn bundled_catalog_is_consistent() {
        let catalog = CatalogLoader::parse(
            include_str!("../../data/abilities.ron"),
            include_str!("../../data/summons.ron"),
            include_str!("../../data/songs.ron"),
        )
        .unwrap();
        assert!(catalog.summon("wolf").is_some());
        assert!(catalog.song("war-march").is_some());
        assert!(catalog.bundle("wolf-kit").is_some());
    }
}
