use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use plantops_core::quantity::ensure_present;
use plantops_core::{DomainError, OperatorContext};
use plantops_inventory::{
    InventoryItem, InventoryItemId, NewInventoryItem, StockTransaction, StorageKind,
    StorageLocation, StorageLocationId,
};

use crate::store::{PlantStore, StoreResult};

/// A silo with the cement item it hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiloStatus {
    pub silo: StorageLocation,
    pub cement: Option<InventoryItem>,
}

impl SiloStatus {
    pub fn fill_ratio(&self) -> Option<Decimal> {
        self.cement.as_ref().and_then(|c| c.fill_ratio())
    }
}

/// Locations, items and restocking.
#[derive(Debug, Clone)]
pub struct InventoryService<S> {
    store: S,
}

impl<S: PlantStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), kind = ?kind), err)]
    pub fn create_location(
        &self,
        ctx: &OperatorContext,
        name: &str,
        kind: StorageKind,
    ) -> StoreResult<StorageLocation> {
        let location = StorageLocation::create(
            StorageLocationId::generate(),
            ctx.tenant_id(),
            name,
            kind,
            Utc::now(),
        )?;
        self.store.insert_location(location.clone())?;
        info!(location = %location.id_typed(), "storage location created");
        Ok(location)
    }

    pub fn list_locations(&self, ctx: &OperatorContext) -> StoreResult<Vec<StorageLocation>> {
        self.store.list_locations(ctx.tenant_id())
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), item = %input.name), err)]
    pub fn create_item(&self, ctx: &OperatorContext, input: NewInventoryItem) -> StoreResult<InventoryItem> {
        if let Some(loc) = input.location_id {
            if self.store.location(ctx.tenant_id(), loc)?.is_none() {
                return Err(DomainError::not_found(format!("storage location {loc}")).into());
            }
        }
        let item = InventoryItem::create(InventoryItemId::generate(), ctx.tenant_id(), input, Utc::now())?;
        self.store.insert_item(item.clone())?;
        info!(item_id = %item.id_typed(), quantity = %item.quantity(), "inventory item created");
        Ok(item)
    }

    pub fn get_item(&self, ctx: &OperatorContext, id: InventoryItemId) -> StoreResult<InventoryItem> {
        self.store
            .item(ctx.tenant_id(), id)?
            .ok_or_else(|| DomainError::not_found(format!("inventory item {id}")).into())
    }

    pub fn list_items(&self, ctx: &OperatorContext) -> StoreResult<Vec<InventoryItem>> {
        self.store.list_items(ctx.tenant_id())
    }

    /// Every silo with its cement item (the first cement item located there).
    pub fn list_silos(&self, ctx: &OperatorContext) -> StoreResult<Vec<SiloStatus>> {
        let items = self.store.list_items(ctx.tenant_id())?;
        let silos = self
            .store
            .list_locations(ctx.tenant_id())?
            .into_iter()
            .filter(StorageLocation::is_silo)
            .map(|silo| {
                let cement = plantops_inventory::cement_item_of(&silo, &items).ok().cloned();
                SiloStatus { silo, cement }
            })
            .collect();
        Ok(silos)
    }

    /// Restock an item. The receipt is recorded as approved by the operator.
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), item = %item_id, amount = %amount), err)]
    pub fn receive_stock(
        &self,
        ctx: &OperatorContext,
        item_id: InventoryItemId,
        amount: Decimal,
        reason: &str,
    ) -> StoreResult<(InventoryItem, StockTransaction)> {
        let reason = ensure_present(reason, "reason")?;
        let (item, tx) = self.store.receive_stock(
            ctx.tenant_id(),
            item_id,
            amount,
            &reason,
            ctx.operator_name(),
            Utc::now(),
        )?;
        info!(quantity = %item.quantity(), "stock received");
        Ok((item, tx))
    }

    pub fn list_transactions(
        &self,
        ctx: &OperatorContext,
        item_id: Option<InventoryItemId>,
    ) -> StoreResult<Vec<StockTransaction>> {
        self.store.list_transactions(ctx.tenant_id(), item_id)
    }
}
