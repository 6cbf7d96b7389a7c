//! Persistence boundary for the plant.
//!
//! `PlantStore` is deliberately coarse: besides plain reads and writes it
//! exposes the two stock-mutating units of work (`commit_consumption` and
//! `receive_stock`) so that the implementation can hold its item locks for the
//! whole check-then-write sequence.

mod in_memory;

pub use in_memory::InMemoryPlantStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use plantops_core::{DomainError, ExpectedVersion, TenantId};
use plantops_inventory::{
    DeductionSet, InventoryItem, InventoryItemId, StockTransaction, StorageLocation,
    StorageLocationId,
};
use plantops_production::{ProductionRun, ProductionRunId, Recipe, RecipeId};

/// Store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A lock was poisoned by a panicking writer; the table is unusable.
    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl StoreError {
    /// The domain error, when this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            StoreError::Poisoned(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How the run row is written inside a consumption commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunWrite {
    /// Immediate run: the row must not exist yet.
    Insert,
    /// Scheduled run being completed: the stored row must match.
    Update(ExpectedVersion),
}

/// One consumption unit of work: deduct, audit, persist the run.
#[derive(Debug, Clone)]
pub struct ConsumptionCommit {
    pub run: ProductionRun,
    pub write: RunWrite,
    pub deductions: DeductionSet,
    /// Audit reason stamped on every OUT transaction.
    pub reason: String,
    pub approver: String,
    pub at: DateTime<Utc>,
}

/// Tenant-scoped plant persistence.
///
/// Every read is scoped by tenant: an id from another tenant resolves to
/// `None` exactly like a missing one.
pub trait PlantStore: Send + Sync {
    fn insert_location(&self, location: StorageLocation) -> StoreResult<()>;
    fn location(&self, tenant_id: TenantId, id: StorageLocationId) -> StoreResult<Option<StorageLocation>>;
    fn list_locations(&self, tenant_id: TenantId) -> StoreResult<Vec<StorageLocation>>;

    fn insert_item(&self, item: InventoryItem) -> StoreResult<()>;
    fn item(&self, tenant_id: TenantId, id: InventoryItemId) -> StoreResult<Option<InventoryItem>>;
    /// Items ordered by id, which is creation order.
    fn list_items(&self, tenant_id: TenantId) -> StoreResult<Vec<InventoryItem>>;
    fn list_transactions(
        &self,
        tenant_id: TenantId,
        item_id: Option<InventoryItemId>,
    ) -> StoreResult<Vec<StockTransaction>>;

    /// Increment one item under its lock and append an IN transaction.
    fn receive_stock(
        &self,
        tenant_id: TenantId,
        item_id: InventoryItemId,
        amount: Decimal,
        reason: &str,
        approver: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<(InventoryItem, StockTransaction)>;

    /// `Duplicate` if the tenant already has the product code.
    fn insert_recipe(&self, recipe: Recipe) -> StoreResult<()>;
    fn update_recipe(&self, recipe: Recipe) -> StoreResult<()>;
    fn recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<Option<Recipe>>;
    fn list_recipes(&self, tenant_id: TenantId) -> StoreResult<Vec<Recipe>>;
    /// `Conflict` while any run references the recipe.
    fn delete_recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<()>;

    fn insert_run(&self, run: ProductionRun) -> StoreResult<()>;
    /// Metadata-only write guarded by the stored version.
    fn update_run(&self, run: ProductionRun, expected: ExpectedVersion) -> StoreResult<()>;
    fn run(&self, tenant_id: TenantId, id: ProductionRunId) -> StoreResult<Option<ProductionRun>>;
    fn list_runs(&self, tenant_id: TenantId) -> StoreResult<Vec<ProductionRun>>;

    /// The atomic consumption unit.
    ///
    /// Locks every deducted item in ascending id order, stages all
    /// deductions, checks the run write, then applies decrements, appends one
    /// OUT transaction per item and writes the run. On any error nothing is
    /// changed. Returns the appended transactions.
    fn commit_consumption(&self, commit: ConsumptionCommit) -> StoreResult<Vec<StockTransaction>>;
}

impl<S> PlantStore for Arc<S>
where
    S: PlantStore + ?Sized,
{
    fn insert_location(&self, location: StorageLocation) -> StoreResult<()> {
        (**self).insert_location(location)
    }

    fn location(&self, tenant_id: TenantId, id: StorageLocationId) -> StoreResult<Option<StorageLocation>> {
        (**self).location(tenant_id, id)
    }

    fn list_locations(&self, tenant_id: TenantId) -> StoreResult<Vec<StorageLocation>> {
        (**self).list_locations(tenant_id)
    }

    fn insert_item(&self, item: InventoryItem) -> StoreResult<()> {
        (**self).insert_item(item)
    }

    fn item(&self, tenant_id: TenantId, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        (**self).item(tenant_id, id)
    }

    fn list_items(&self, tenant_id: TenantId) -> StoreResult<Vec<InventoryItem>> {
        (**self).list_items(tenant_id)
    }

    fn list_transactions(
        &self,
        tenant_id: TenantId,
        item_id: Option<InventoryItemId>,
    ) -> StoreResult<Vec<StockTransaction>> {
        (**self).list_transactions(tenant_id, item_id)
    }

    fn receive_stock(
        &self,
        tenant_id: TenantId,
        item_id: InventoryItemId,
        amount: Decimal,
        reason: &str,
        approver: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<(InventoryItem, StockTransaction)> {
        (**self).receive_stock(tenant_id, item_id, amount, reason, approver, at)
    }

    fn insert_recipe(&self, recipe: Recipe) -> StoreResult<()> {
        (**self).insert_recipe(recipe)
    }

    fn update_recipe(&self, recipe: Recipe) -> StoreResult<()> {
        (**self).update_recipe(recipe)
    }

    fn recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<Option<Recipe>> {
        (**self).recipe(tenant_id, id)
    }

    fn list_recipes(&self, tenant_id: TenantId) -> StoreResult<Vec<Recipe>> {
        (**self).list_recipes(tenant_id)
    }

    fn delete_recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<()> {
        (**self).delete_recipe(tenant_id, id)
    }

    fn insert_run(&self, run: ProductionRun) -> StoreResult<()> {
        (**self).insert_run(run)
    }

    fn update_run(&self, run: ProductionRun, expected: ExpectedVersion) -> StoreResult<()> {
        (**self).update_run(run, expected)
    }

    fn run(&self, tenant_id: TenantId, id: ProductionRunId) -> StoreResult<Option<ProductionRun>> {
        (**self).run(tenant_id, id)
    }

    fn list_runs(&self, tenant_id: TenantId) -> StoreResult<Vec<ProductionRun>> {
        (**self).list_runs(tenant_id)
    }

    fn commit_consumption(&self, commit: ConsumptionCommit) -> StoreResult<Vec<StockTransaction>> {
        (**self).commit_consumption(commit)
    }
}
