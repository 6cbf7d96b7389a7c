//! Application services over a [`PlantStore`](crate::store::PlantStore).
//!
//! Every entry point takes an [`OperatorContext`](plantops_core::OperatorContext)
//! and scopes all reads and writes to its tenant.

pub mod catalog;
pub mod engine;
pub mod inventory;
pub mod reporting;
pub mod scheduler;

pub use catalog::{NewRecipe, RecipeCatalog};
pub use engine::{ConsumptionEngine, ConsumptionOutcome};
pub use inventory::{InventoryService, SiloStatus};
pub use reporting::VarianceReporter;
pub use scheduler::{CompleteRun, ImmediateRun, ProductionScheduler, ScheduleRun};

use plantops_production::NotificationDispatcher;

use crate::config::PlantConfig;
use crate::store::PlantStore;

/// Every service wired to one store.
#[derive(Debug, Clone)]
pub struct PlantServices<S, N> {
    pub catalog: RecipeCatalog<S>,
    pub inventory: InventoryService<S>,
    pub scheduler: ProductionScheduler<S, N>,
    pub reporter: VarianceReporter<S>,
}

impl<S, N> PlantServices<S, N>
where
    S: PlantStore + Clone,
    N: NotificationDispatcher,
{
    pub fn new(store: S, notifier: N, config: &PlantConfig) -> Self {
        Self {
            catalog: RecipeCatalog::new(store.clone()),
            inventory: InventoryService::new(store.clone()),
            scheduler: ProductionScheduler::new(store.clone(), notifier, config.system_approver.clone()),
            reporter: VarianceReporter::new(store),
        }
    }
}
