//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive encounters.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use combat_core::{CatalogOracle, CombatConfig, CombatState, DamageHooks, Fnv1aRoll, RollOracle};

use crate::api::{AutoConfirm, ConfirmationProvider, Result, RuntimeError, RuntimeHandle};
use crate::authority::{AuthorityExecutor, OwnershipCheck, OwnershipTable};
use crate::events::{EventBus, EventLog};
use crate::workers::{Command, SimulationWorker, World};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Entries kept by the rolling event log.
    pub event_log_capacity: usize,
    /// Minimum time between two admitted turn triggers.
    pub min_turn_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
            event_log_capacity: 512,
            min_turn_interval: Duration::ZERO,
        }
    }
}

/// Main runtime that orchestrates combat simulation
///
/// Design: Runtime owns the worker task.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker exits once every handle clone has been dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    state: Option<CombatState>,
    catalog: Option<Arc<dyn CatalogOracle>>,
    hooks: DamageHooks,
    roll: Arc<dyn RollOracle>,
    confirm: Arc<dyn ConfirmationProvider>,
    ownership: Arc<dyn OwnershipCheck>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            state: None,
            catalog: None,
            hooks: DamageHooks::empty(),
            roll: Arc::new(Fnv1aRoll),
            confirm: Arc::new(AutoConfirm),
            // Nobody is authorized until an ownership source is supplied.
            ownership: Arc::new(OwnershipTable::new()),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide initial combat state
    pub fn initial_state(mut self, state: CombatState) -> Self {
        self.state = Some(state);
        self
    }

    /// Set the required ability/summon/song catalog
    pub fn catalog(self, catalog: impl CatalogOracle + 'static) -> Self {
        self.shared_catalog(Arc::new(catalog))
    }

    pub fn shared_catalog(mut self, catalog: Arc<dyn CatalogOracle>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Damage pipeline checkpoint hooks (default: none)
    pub fn hooks(mut self, hooks: DamageHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replace the deterministic roll function (default: FNV-1a)
    pub fn roll_oracle(mut self, roll: impl RollOracle + 'static) -> Self {
        self.roll = Arc::new(roll);
        self
    }

    /// Decides AI casts at the suspend point (default: [`AutoConfirm`])
    pub fn confirmation(mut self, confirm: impl ConfirmationProvider + 'static) -> Self {
        self.confirm = Arc::new(confirm);
        self
    }

    /// Maps requesting participants to the combatants they control
    pub fn ownership(mut self, ownership: impl OwnershipCheck + 'static) -> Self {
        self.ownership = Arc::new(ownership);
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let world = World {
            state: self.state.unwrap_or_default(),
            config: self.config.combat,
            catalog,
            hooks: self.hooks,
            roll: self.roll,
        };
        let sim_worker = SimulationWorker::new(
            world,
            command_rx,
            event_bus,
            EventLog::new(self.config.event_log_capacity),
            self.config.min_turn_interval,
            self.confirm,
            AuthorityExecutor::new(self.ownership),
        );

        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            sim_worker_handle,
        })
    }
}
