use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use plantops_core::{DomainError, ExpectedVersion, TenantId, Versioned};
use plantops_inventory::{
    InventoryItem, InventoryItemId, StockTransaction, StorageLocation, StorageLocationId,
};
use plantops_production::{ProductionRun, ProductionRunId, Recipe, RecipeId};

use super::{ConsumptionCommit, PlantStore, RunWrite, StoreError, StoreResult};

type ItemHandle = Arc<Mutex<InventoryItem>>;

#[derive(Debug, Default)]
struct Tables {
    locations: HashMap<(TenantId, StorageLocationId), StorageLocation>,
    recipes: HashMap<(TenantId, RecipeId), Recipe>,
    runs: HashMap<(TenantId, ProductionRunId), ProductionRun>,
    transactions: Vec<StockTransaction>,
}

impl Tables {
    /// A new run must point at a recipe that still exists.
    fn ensure_recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<()> {
        if self.recipes.contains_key(&(tenant_id, id)) {
            return Ok(());
        }
        Err(DomainError::not_found(format!("recipe {id}")).into())
    }
}

/// In-memory plant store.
///
/// Each inventory item sits behind its own mutex; everything else shares one
/// `RwLock`. Lock order is always: item mutexes in ascending id order, then
/// the table lock. The item map's own lock is only held to clone handles.
#[derive(Debug, Default)]
pub struct InMemoryPlantStore {
    items: RwLock<HashMap<(TenantId, InventoryItemId), ItemHandle>>,
    tables: RwLock<Tables>,
}

impl InMemoryPlantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve handles for `ids` (already sorted). Missing ids are `NotFound`.
    fn handles(&self, tenant_id: TenantId, ids: &[InventoryItemId]) -> StoreResult<Vec<(InventoryItemId, ItemHandle)>> {
        let items = self.items.read().map_err(|_| StoreError::Poisoned("items"))?;
        ids.iter()
            .map(|id| {
                items
                    .get(&(tenant_id, *id))
                    .map(|h| (*id, Arc::clone(h)))
                    .ok_or_else(|| StoreError::from(DomainError::not_found(format!("inventory item {id}"))))
            })
            .collect()
    }

    fn lock_item(handle: &ItemHandle) -> StoreResult<MutexGuard<'_, InventoryItem>> {
        handle.lock().map_err(|_| StoreError::Poisoned("inventory item"))
    }

    fn write_tables(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned("tables"))
    }

    fn read_tables<T>(&self, f: impl FnOnce(&Tables) -> T) -> StoreResult<T> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned("tables"))?;
        Ok(f(&tables))
    }
}

impl PlantStore for InMemoryPlantStore {
    fn insert_location(&self, location: StorageLocation) -> StoreResult<()> {
        let mut tables = self.write_tables()?;
        tables
            .locations
            .insert((location.tenant_id(), location.id_typed()), location);
        Ok(())
    }

    fn location(&self, tenant_id: TenantId, id: StorageLocationId) -> StoreResult<Option<StorageLocation>> {
        self.read_tables(|t| t.locations.get(&(tenant_id, id)).cloned())
    }

    fn list_locations(&self, tenant_id: TenantId) -> StoreResult<Vec<StorageLocation>> {
        self.read_tables(|t| {
            let mut out: Vec<_> = t
                .locations
                .iter()
                .filter(|((tid, _), _)| *tid == tenant_id)
                .map(|(_, l)| l.clone())
                .collect();
            out.sort_by_key(|l| l.id_typed());
            out
        })
    }

    fn insert_item(&self, item: InventoryItem) -> StoreResult<()> {
        let mut items = self.items.write().map_err(|_| StoreError::Poisoned("items"))?;
        let key = (item.tenant_id(), item.id_typed());
        if items.contains_key(&key) {
            return Err(DomainError::conflict(format!("inventory item {} already exists", key.1)).into());
        }
        items.insert(key, Arc::new(Mutex::new(item)));
        Ok(())
    }

    fn item(&self, tenant_id: TenantId, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        let handle = {
            let items = self.items.read().map_err(|_| StoreError::Poisoned("items"))?;
            items.get(&(tenant_id, id)).cloned()
        };
        match handle {
            Some(h) => Ok(Some(Self::lock_item(&h)?.clone())),
            None => Ok(None),
        }
    }

    fn list_items(&self, tenant_id: TenantId) -> StoreResult<Vec<InventoryItem>> {
        let mut handles: Vec<_> = {
            let items = self.items.read().map_err(|_| StoreError::Poisoned("items"))?;
            items
                .iter()
                .filter(|((tid, _), _)| *tid == tenant_id)
                .map(|((_, id), h)| (*id, Arc::clone(h)))
                .collect()
        };
        handles.sort_by_key(|(id, _)| *id);

        handles
            .iter()
            .map(|(_, h)| Ok(Self::lock_item(h)?.clone()))
            .collect()
    }

    fn list_transactions(
        &self,
        tenant_id: TenantId,
        item_id: Option<InventoryItemId>,
    ) -> StoreResult<Vec<StockTransaction>> {
        self.read_tables(|t| {
            t.transactions
                .iter()
                .filter(|tx| tx.tenant_id == tenant_id)
                .filter(|tx| item_id.is_none_or(|id| tx.item_id == id))
                .cloned()
                .collect()
        })
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
        let handles = self.handles(tenant_id, &[item_id])?;
        let (_, handle) = &handles[0];
        let mut guard = Self::lock_item(handle)?;

        let mut next = guard.clone();
        next.receive(amount, at)?;
        let tx = StockTransaction::receipt(&next, amount, reason, approver, at);

        let mut tables = self.write_tables()?;
        tables.transactions.push(tx.clone());
        *guard = next.clone();

        Ok((next, tx))
    }

    fn insert_recipe(&self, recipe: Recipe) -> StoreResult<()> {
        let mut tables = self.write_tables()?;
        let tenant_id = recipe.tenant_id();
        let taken = tables.recipes.values().any(|r| {
            r.tenant_id() == tenant_id && r.product_code().eq_ignore_ascii_case(recipe.product_code())
        });
        if taken {
            return Err(DomainError::duplicate(format!(
                "product code '{}' already exists",
                recipe.product_code()
            ))
            .into());
        }
        tables.recipes.insert((tenant_id, recipe.id_typed()), recipe);
        Ok(())
    }

    fn update_recipe(&self, recipe: Recipe) -> StoreResult<()> {
        let mut tables = self.write_tables()?;
        let key = (recipe.tenant_id(), recipe.id_typed());
        match tables.recipes.get_mut(&key) {
            Some(slot) => {
                *slot = recipe;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("recipe {}", key.1)).into()),
        }
    }

    fn recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<Option<Recipe>> {
        self.read_tables(|t| t.recipes.get(&(tenant_id, id)).cloned())
    }

    fn list_recipes(&self, tenant_id: TenantId) -> StoreResult<Vec<Recipe>> {
        self.read_tables(|t| {
            let mut out: Vec<_> = t
                .recipes
                .values()
                .filter(|r| r.tenant_id() == tenant_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| a.product_code().cmp(b.product_code()));
            out
        })
    }

    fn delete_recipe(&self, tenant_id: TenantId, id: RecipeId) -> StoreResult<()> {
        let mut tables = self.write_tables()?;
        if !tables.recipes.contains_key(&(tenant_id, id)) {
            return Err(DomainError::not_found(format!("recipe {id}")).into());
        }
        let referenced = tables
            .runs
            .values()
            .filter(|r| r.tenant_id() == tenant_id && r.recipe_id() == id)
            .count();
        if referenced > 0 {
            return Err(DomainError::conflict(format!(
                "recipe {id} is referenced by {referenced} production run(s)"
            ))
            .into());
        }
        tables.recipes.remove(&(tenant_id, id));
        Ok(())
    }

    fn insert_run(&self, run: ProductionRun) -> StoreResult<()> {
        let mut tables = self.write_tables()?;
        tables.ensure_recipe(run.tenant_id(), run.recipe_id())?;
        let key = (run.tenant_id(), run.id_typed());
        if tables.runs.contains_key(&key) {
            return Err(DomainError::conflict(format!("production run {} already exists", key.1)).into());
        }
        tables.runs.insert(key, run);
        Ok(())
    }

    fn update_run(&self, run: ProductionRun, expected: ExpectedVersion) -> StoreResult<()> {
        let mut tables = self.write_tables()?;
        let key = (run.tenant_id(), run.id_typed());
        let stored = tables
            .runs
            .get_mut(&key)
            .ok_or_else(|| DomainError::not_found(format!("production run {}", key.1)))?;
        expected.check(stored.version())?;
        *stored = run;
        Ok(())
    }

    fn run(&self, tenant_id: TenantId, id: ProductionRunId) -> StoreResult<Option<ProductionRun>> {
        self.read_tables(|t| t.runs.get(&(tenant_id, id)).cloned())
    }

    fn list_runs(&self, tenant_id: TenantId) -> StoreResult<Vec<ProductionRun>> {
        self.read_tables(|t| {
            let mut out: Vec<_> = t
                .runs
                .values()
                .filter(|r| r.tenant_id() == tenant_id)
                .cloned()
                .collect();
            out.sort_by_key(|r| r.id_typed());
            out
        })
    }

    fn commit_consumption(&self, commit: ConsumptionCommit) -> StoreResult<Vec<StockTransaction>> {
        let tenant_id = commit.run.tenant_id();
        let run_id = commit.run.id_typed();

        let handles = self.handles(tenant_id, &commit.deductions.lock_order())?;
        let mut guards = Vec::with_capacity(handles.len());
        for (id, handle) in &handles {
            guards.push((*id, Self::lock_item(handle)?));
        }

        let staged = {
            let locked = &guards;
            commit.deductions.stage(
                move |id| locked.iter().find(|(gid, _)| gid == id).map(|(_, g)| &**g),
                commit.at,
            )?
        };

        let mut tables = self.write_tables()?;
        let key = (tenant_id, run_id);
        match commit.write {
            RunWrite::Insert => {
                tables.ensure_recipe(tenant_id, commit.run.recipe_id())?;
                if tables.runs.contains_key(&key) {
                    return Err(DomainError::conflict(format!("production run {run_id} already exists")).into());
                }
            }
            RunWrite::Update(expected) => {
                let stored = tables
                    .runs
                    .get(&key)
                    .ok_or_else(|| DomainError::not_found(format!("production run {run_id}")))?;
                expected.check(stored.version())?;
            }
        }

        // Past this point nothing can fail.
        let mut transactions = Vec::with_capacity(staged.len());
        for next in staged {
            let amount = commit.deductions.amount_for(next.id_typed());
            transactions.push(StockTransaction::consumption(
                &next,
                amount,
                commit.reason.clone(),
                &commit.approver,
                run_id.0,
                commit.at,
            ));
            if let Some((_, guard)) = guards.iter_mut().find(|(id, _)| *id == next.id_typed()) {
                **guard = next;
            }
        }
        tables.transactions.extend(transactions.iter().cloned());
        tables.runs.insert(key, commit.run);

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantops_inventory::{DeductionSet, ItemType, NewInventoryItem, StockDirection};
    use plantops_production::{
        ConsumptionPlan, IngredientRole, MaterialRequirement, RecipeIngredient, RunDetails,
    };
    use plantops_core::{OperatorContext, UserId};
    use rust_decimal_macros::dec;

    fn item(tenant_id: TenantId, name: &str, qty: Decimal) -> InventoryItem {
        capped_item(tenant_id, name, qty, Some(dec!(1000)))
    }

    fn capped_item(tenant_id: TenantId, name: &str, qty: Decimal, cap: Option<Decimal>) -> InventoryItem {
        InventoryItem::create(
            InventoryItemId::generate(),
            tenant_id,
            NewInventoryItem {
                name: name.into(),
                quantity: qty,
                unit: "kg".into(),
                item_type: ItemType::Aggregate,
                max_capacity: cap,
                location_id: None,
                unit_cost: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn recipe(ctx: &OperatorContext, code: &str, bound: InventoryItemId) -> Recipe {
        Recipe::create(
            RecipeId::generate(),
            ctx.tenant_id(),
            code,
            "Screed",
            vec![RecipeIngredient {
                material: "Sand".into(),
                role: IngredientRole::Bulk,
                item_id: Some(bound),
                quantity_per_unit: dec!(100),
                unit: "kg".into(),
            }],
            Utc::now(),
        )
        .unwrap()
    }

    fn immediate_run(ctx: &OperatorContext, recipe: &Recipe, item_id: InventoryItemId, batch: Decimal) -> ProductionRun {
        let plan = ConsumptionPlan {
            batch_quantity: batch,
            requirements: vec![MaterialRequirement {
                material: "Sand".into(),
                role: IngredientRole::Bulk,
                item_id: Some(item_id),
                per_unit: dec!(100),
                required: dec!(100) * batch,
                unit: "kg".into(),
                unit_cost: None,
            }],
        };
        ProductionRun::immediate(
            ProductionRunId::generate(),
            ctx,
            recipe,
            &plan,
            None,
            RunDetails::default(),
            Utc::now(),
        )
        .unwrap()
    }

    fn commit_for(run: ProductionRun, item_id: InventoryItemId, amount: Decimal) -> ConsumptionCommit {
        let mut deductions = DeductionSet::new();
        deductions.add(item_id, amount).unwrap();
        ConsumptionCommit {
            run,
            write: RunWrite::Insert,
            deductions,
            reason: "test".into(),
            approver: "System".into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn items_are_tenant_scoped() {
        let store = InMemoryPlantStore::new();
        let sand = item(TenantId::new(), "Sand", dec!(10));
        let id = sand.id_typed();
        store.insert_item(sand).unwrap();

        assert!(store.item(TenantId::new(), id).unwrap().is_none());
    }

    #[test]
    fn commit_applies_deductions_and_audits() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let sand = item(ctx.tenant_id(), "Sand", dec!(500));
        let sand_id = sand.id_typed();
        store.insert_item(sand).unwrap();
        let r = recipe(&ctx, "SCR", sand_id);
        store.insert_recipe(r.clone()).unwrap();
        let run = immediate_run(&ctx, &r, sand_id, dec!(3));

        let txs = store.commit_consumption(commit_for(run.clone(), sand_id, dec!(300))).unwrap();

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].direction, StockDirection::Out);
        assert_eq!(txs[0].quantity, dec!(300));
        assert_eq!(txs[0].reference, Some(run.id_typed().0));
        assert_eq!(store.item(ctx.tenant_id(), sand_id).unwrap().unwrap().quantity(), dec!(200));
        assert!(store.run(ctx.tenant_id(), run.id_typed()).unwrap().is_some());
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let sand = item(ctx.tenant_id(), "Sand", dec!(50));
        let sand_id = sand.id_typed();
        store.insert_item(sand).unwrap();
        let r = recipe(&ctx, "SCR", sand_id);
        store.insert_recipe(r.clone()).unwrap();
        let run = immediate_run(&ctx, &r, sand_id, dec!(1));

        let err = store.commit_consumption(commit_for(run.clone(), sand_id, dec!(100))).unwrap_err();

        assert!(matches!(err.as_domain(), Some(DomainError::InsufficientStock(_))));
        assert_eq!(store.item(ctx.tenant_id(), sand_id).unwrap().unwrap().quantity(), dec!(50));
        assert!(store.list_transactions(ctx.tenant_id(), None).unwrap().is_empty());
        assert!(store.run(ctx.tenant_id(), run.id_typed()).unwrap().is_none());
    }

    #[test]
    fn stale_run_version_aborts_commit() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let sand = item(ctx.tenant_id(), "Sand", dec!(500));
        let sand_id = sand.id_typed();
        store.insert_item(sand).unwrap();
        let r = recipe(&ctx, "SCR", sand_id);
        store.insert_recipe(r.clone()).unwrap();
        let run = immediate_run(&ctx, &r, sand_id, dec!(1));
        store.insert_run(run.clone()).unwrap();

        let mut commit = commit_for(run, sand_id, dec!(100));
        commit.write = RunWrite::Update(ExpectedVersion::Exact(7));
        let err = store.commit_consumption(commit).unwrap_err();

        assert!(matches!(err.as_domain(), Some(DomainError::Conflict(_))));
        assert_eq!(store.item(ctx.tenant_id(), sand_id).unwrap().unwrap().quantity(), dec!(500));
    }

    #[test]
    fn duplicate_product_code_is_rejected() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let bound = InventoryItemId::generate();
        store.insert_recipe(recipe(&ctx, "C25", bound)).unwrap();

        let err = store.insert_recipe(recipe(&ctx, "c25", bound)).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Duplicate(_))));
    }

    #[test]
    fn referenced_recipe_cannot_be_deleted() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let bound = InventoryItemId::generate();
        let r = recipe(&ctx, "C25", bound);
        store.insert_recipe(r.clone()).unwrap();
        store.insert_run(immediate_run(&ctx, &r, bound, dec!(1))).unwrap();

        let err = store.delete_recipe(ctx.tenant_id(), r.id_typed()).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Conflict(_))));
    }

    #[test]
    fn run_for_a_deleted_recipe_is_not_found() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let sand = item(ctx.tenant_id(), "Sand", dec!(500));
        let sand_id = sand.id_typed();
        store.insert_item(sand).unwrap();
        let r = recipe(&ctx, "SCR", sand_id);
        store.insert_recipe(r.clone()).unwrap();
        store.delete_recipe(ctx.tenant_id(), r.id_typed()).unwrap();

        let err = store.insert_run(immediate_run(&ctx, &r, sand_id, dec!(1))).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

        let run = immediate_run(&ctx, &r, sand_id, dec!(1));
        let err = store.commit_consumption(commit_for(run.clone(), sand_id, dec!(100))).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
        assert_eq!(store.item(ctx.tenant_id(), sand_id).unwrap().unwrap().quantity(), dec!(500));
        assert!(store.run(ctx.tenant_id(), run.id_typed()).unwrap().is_none());
        assert!(store.list_transactions(ctx.tenant_id(), None).unwrap().is_empty());
    }

    #[test]
    fn unrepresentable_receipt_leaves_the_item_usable() {
        let store = InMemoryPlantStore::new();
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "op");
        let sand = capped_item(ctx.tenant_id(), "Sand", dec!(500), None);
        let sand_id = sand.id_typed();
        store.insert_item(sand).unwrap();
        let r = recipe(&ctx, "SCR", sand_id);
        store.insert_recipe(r.clone()).unwrap();

        let err = store
            .receive_stock(ctx.tenant_id(), sand_id, Decimal::MAX, "delivery", "System", Utc::now())
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));
        assert_eq!(store.item(ctx.tenant_id(), sand_id).unwrap().unwrap().quantity(), dec!(500));

        let run = immediate_run(&ctx, &r, sand_id, dec!(1));
        store.commit_consumption(commit_for(run, sand_id, dec!(100))).unwrap();
        assert_eq!(store.item(ctx.tenant_id(), sand_id).unwrap().unwrap().quantity(), dec!(400));
    }

    #[test]
    fn receive_respects_capacity() {
        let store = InMemoryPlantStore::new();
        let tenant = TenantId::new();
        let sand = item(tenant, "Sand", dec!(900));
        let id = sand.id_typed();
        store.insert_item(sand).unwrap();

        let (after, tx) = store.receive_stock(tenant, id, dec!(100), "delivery", "System", Utc::now()).unwrap();
        assert_eq!(after.quantity(), dec!(1000));
        assert_eq!(tx.direction, StockDirection::In);

        let err = store.receive_stock(tenant, id, dec!(1), "delivery", "System", Utc::now()).unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));
        assert_eq!(store.list_transactions(tenant, Some(id)).unwrap().len(), 1);
    }
}
