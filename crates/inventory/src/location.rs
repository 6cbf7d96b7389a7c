use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plantops_core::quantity::ensure_present;
use plantops_core::{DomainError, DomainResult, Entity, TenantId};

use crate::item::InventoryItem;

plantops_core::entity_id!(StorageLocationId, "StorageLocationId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Warehouse,
    Yard,
    /// Bulk storage; hosts one cement item.
    Silo,
}

/// A place that owns zero or more inventory items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    id: StorageLocationId,
    tenant_id: TenantId,
    name: String,
    kind: StorageKind,
    created_at: DateTime<Utc>,
}

impl StorageLocation {
    pub fn create(
        id: StorageLocationId,
        tenant_id: TenantId,
        name: &str,
        kind: StorageKind,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            tenant_id,
            name: ensure_present(name, "location name")?,
            kind,
            created_at: at,
        })
    }

    pub fn id_typed(&self) -> StorageLocationId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn is_silo(&self) -> bool {
        self.kind == StorageKind::Silo
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for StorageLocation {
    type Id = StorageLocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Resolve the cement item a silo hosts.
///
/// `items` are the items stored in `silo`, in a stable order; the first
/// Cement-typed one wins.
pub fn cement_item_of<'a>(
    silo: &StorageLocation,
    items: &'a [InventoryItem],
) -> DomainResult<&'a InventoryItem> {
    if !silo.is_silo() {
        return Err(DomainError::validation(format!(
            "location '{}' is not a silo",
            silo.name
        )));
    }

    items
        .iter()
        .filter(|i| i.location_id() == Some(silo.id))
        .find(|i| i.is_cement())
        .ok_or_else(|| {
            DomainError::linkage(format!("silo '{}' holds no cement item", silo.name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{InventoryItemId, ItemType, NewInventoryItem};
    use rust_decimal_macros::dec;

    fn item(tenant_id: TenantId, name: &str, ty: ItemType, loc: StorageLocationId) -> InventoryItem {
        InventoryItem::create(
            InventoryItemId::generate(),
            tenant_id,
            NewInventoryItem {
                name: name.into(),
                quantity: dec!(100),
                unit: "kg".into(),
                item_type: ty,
                max_capacity: None,
                location_id: Some(loc),
                unit_cost: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn silo_resolves_its_cement_item() {
        let tenant_id = TenantId::new();
        let silo = StorageLocation::create(
            StorageLocationId::generate(),
            tenant_id,
            "Silo A",
            StorageKind::Silo,
            Utc::now(),
        )
        .unwrap();
        let items = vec![
            item(tenant_id, "Dust", ItemType::Other, silo.id_typed()),
            item(tenant_id, "CEM I 42.5", ItemType::Cement, silo.id_typed()),
        ];

        let cement = cement_item_of(&silo, &items).unwrap();
        assert_eq!(cement.name(), "CEM I 42.5");
    }

    #[test]
    fn empty_silo_is_a_linkage_error() {
        let silo = StorageLocation::create(
            StorageLocationId::generate(),
            TenantId::new(),
            "Silo B",
            StorageKind::Silo,
            Utc::now(),
        )
        .unwrap();

        assert!(matches!(cement_item_of(&silo, &[]), Err(DomainError::Linkage(_))));
    }

    #[test]
    fn warehouse_is_not_a_silo() {
        let tenant_id = TenantId::new();
        let wh = StorageLocation::create(
            StorageLocationId::generate(),
            tenant_id,
            "Yard store",
            StorageKind::Warehouse,
            Utc::now(),
        )
        .unwrap();
        let items = vec![item(tenant_id, "Bagged cement", ItemType::Cement, wh.id_typed())];

        assert!(matches!(cement_item_of(&wh, &items), Err(DomainError::Validation(_))));
    }
}
