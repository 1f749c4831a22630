//! Content factory for building catalogs and configuration from data files.

use std::path::PathBuf;

use combat_core::CombatConfig;

use crate::catalog::Catalog;
use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult};

const BUNDLED_ABILITIES: &str = include_str!("../../data/abilities.ron");
const BUNDLED_SUMMONS: &str = include_str!("../../data/summons.ron");
const BUNDLED_SONGS: &str = include_str!("../../data/songs.ron");
const BUNDLED_CONFIG: &str = include_str!("../../data/combat.toml");

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── combat.toml
/// ├── abilities.ron
/// ├── summons.ron
/// └── songs.ron
/// ```
pub struct ContentFactory {
    data_dir: Option<PathBuf>,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
        }
    }

    /// Factory over the sample data compiled into this crate.
    pub fn bundled() -> Self {
        Self { data_dir: None }
    }

    /// Load combat configuration from `combat.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        match &self.data_dir {
            Some(dir) => ConfigLoader::load(&dir.join("combat.toml")),
            None => ConfigLoader::parse(BUNDLED_CONFIG),
        }
    }

    /// Load and validate the ability, summon and song catalogs.
    pub fn load_catalog(&self) -> LoadResult<Catalog> {
        match &self.data_dir {
            Some(dir) => CatalogLoader::load(dir),
            None => CatalogLoader::parse(BUNDLED_ABILITIES, BUNDLED_SUMMONS, BUNDLED_SONGS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_reports_the_path() {
        let factory = ContentFactory::new("/nonexistent/combat-data");
        let err = factory.load_config().unwrap_err().to_string();
        assert!(err.contains("combat.toml"));
    }

    #[test]
    fn bundled_content_loads() {
        let factory = ContentFactory::bundled();
        assert!(factory.load_config().is_ok());
        assert!(!factory.load_catalog().unwrap().is_empty());
    }
}
