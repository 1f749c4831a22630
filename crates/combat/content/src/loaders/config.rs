//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse combat config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::ConditionKind;

    #[test]
    fn partial_files_keep_defaults() {
        let config = ConfigLoader::parse(
            r#"
            [threat]
            hysteresis_percent = 20

            [effect_conditions]
            frost-aura = ["slowed"]
            "#,
        )
        .unwrap();
        assert_eq!(config.threat.hysteresis_percent, 20);
        assert_eq!(config.threat.tank_multiplier_percent, 150);
        assert_eq!(config.breaks.mez_default_percent, 35);
        assert_eq!(
            config.effect_conditions.get("frost-aura"),
            Some(&vec![ConditionKind::Slowed])
        );
    }

    #[test]
    fn shipped_config_parses() {
        let config = ConfigLoader::parse(include_str!("../../data/combat.toml")).unwrap();
        assert_eq!(config.songs.max_active, 3);
        assert_eq!(config.mitigation.resist_cap_percent, 75);
    }

    #[test]
    fn malformed_files_are_errors() {
        assert!(ConfigLoader::parse("[threat]\nhysteresis_percent = \"high\"").is_err());
    }
}
