//! Simulator settings read from the environment.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use combat_content::ContentFactory;
use combat_core::CombatConfig;
use combat_runtime::RuntimeConfig;

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Content directory holding `combat.toml` and the RON catalogs.
    pub content_dir: Option<PathBuf>,
    pub rounds: u32,
    /// Trailing event log entries printed after the encounter.
    pub event_log: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            content_dir: None,
            rounds: 4,
            event_log: 12,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.content_dir = env::var("COMBAT_CONFIG").ok().map(PathBuf::from);

        if let Some(rounds) = read_env::<u32>("COMBAT_ROUNDS") {
            config.rounds = rounds.max(1);
        }
        if let Some(entries) = read_env::<usize>("COMBAT_EVENT_LOG") {
            config.event_log = entries;
        }

        config
    }

    pub fn content(&self) -> ContentFactory {
        match &self.content_dir {
            Some(dir) => ContentFactory::new(dir.clone()),
            None => ContentFactory::bundled(),
        }
    }

    pub fn runtime_config(&self, combat: CombatConfig) -> RuntimeConfig {
        RuntimeConfig {
            combat,
            event_log_capacity: self.event_log.max(RuntimeConfig::default().event_log_capacity),
            ..RuntimeConfig::default()
        }
    }

    pub fn load_combat(&self) -> Result<CombatConfig> {
        self.content()
            .load_config()
            .with_context(|| format!("loading combat config from {:?}", self.content_dir))
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
