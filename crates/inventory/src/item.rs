use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::quantity::{checked_add, ensure_non_negative, ensure_positive, ensure_present};
use plantops_core::{DomainError, DomainResult, Entity, Shortage, TenantId};

use crate::location::StorageLocationId;

plantops_core::entity_id!(InventoryItemId, "InventoryItemId");

/// What kind of material an item holds.
///
/// `Cement` marks bulk-cement entities; a silo's cement item is the one the
/// consumption engine draws cement-role ingredients from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Cement,
    Aggregate,
    Water,
    Admixture,
    Other,
}

/// Input for registering a new inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub item_type: ItemType,
    pub max_capacity: Option<Decimal>,
    pub location_id: Option<StorageLocationId>,
    pub unit_cost: Option<Decimal>,
}

/// A quantity-tracked raw material.
///
/// `quantity` is never negative. It only changes through [`InventoryItem::decrement`]
/// (consumption) and [`InventoryItem::receive`] (restocking).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: InventoryItemId,
    tenant_id: TenantId,
    name: String,
    quantity: Decimal,
    unit: String,
    item_type: ItemType,
    max_capacity: Option<Decimal>,
    location_id: Option<StorageLocationId>,
    unit_cost: Option<Decimal>,
    updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn create(
        id: InventoryItemId,
        tenant_id: TenantId,
        input: NewInventoryItem,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = ensure_present(&input.name, "item name")?;
        let unit = ensure_present(&input.unit, "unit")?;
        let quantity = ensure_non_negative(input.quantity, "quantity")?;

        if let Some(cap) = input.max_capacity {
            ensure_positive(cap, "max capacity")?;
            if quantity > cap {
                return Err(DomainError::validation(format!(
                    "quantity {quantity} exceeds max capacity {cap}"
                )));
            }
        }
        if let Some(cost) = input.unit_cost {
            ensure_non_negative(cost, "unit cost")?;
        }

        Ok(Self {
            id,
            tenant_id,
            name,
            quantity,
            unit,
            item_type: input.item_type,
            max_capacity: input.max_capacity,
            location_id: input.location_id,
            unit_cost: input.unit_cost,
            updated_at: at,
        })
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn is_cement(&self) -> bool {
        self.item_type == ItemType::Cement
    }

    pub fn max_capacity(&self) -> Option<Decimal> {
        self.max_capacity
    }

    pub fn location_id(&self) -> Option<StorageLocationId> {
        self.location_id
    }

    pub fn unit_cost(&self) -> Option<Decimal> {
        self.unit_cost
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Share of `max_capacity` currently filled (0..=1), if a ceiling is set.
    pub fn fill_ratio(&self) -> Option<Decimal> {
        self.max_capacity
            .filter(|cap| *cap > Decimal::ZERO)
            .and_then(|cap| self.quantity.checked_div(cap))
    }

    /// Availability check without mutation.
    pub fn ensure_available(&self, required: Decimal) -> Result<(), Shortage> {
        if self.quantity >= required {
            return Ok(());
        }
        Err(Shortage {
            item_name: self.name.clone(),
            required,
            available: self.quantity,
            unit: self.unit.clone(),
        })
    }

    /// Consume `amount`. Fails without mutation if stock is insufficient.
    pub fn decrement(&mut self, amount: Decimal, at: DateTime<Utc>) -> DomainResult<()> {
        ensure_non_negative(amount, "deduction amount")?;
        self.ensure_available(amount)
            .map_err(DomainError::InsufficientStock)?;

        self.quantity -= amount;
        self.updated_at = at;
        Ok(())
    }

    /// Restock `amount`, refusing to exceed `max_capacity`.
    pub fn receive(&mut self, amount: Decimal, at: DateTime<Utc>) -> DomainResult<()> {
        ensure_positive(amount, "received amount")?;

        let new_quantity = checked_add(self.quantity, amount, "stock after receipt")?;
        if let Some(cap) = self.max_capacity {
            if new_quantity > cap {
                return Err(DomainError::validation(format!(
                    "receiving {amount} {} into {} would exceed its capacity of {cap} (currently {})",
                    self.unit, self.name, self.quantity
                )));
            }
        }

        self.quantity = new_quantity;
        self.updated_at = at;
        Ok(())
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
