use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::{AggregateId, TenantId};

use crate::item::{InventoryItem, InventoryItemId};

plantops_core::entity_id!(StockTransactionId, "StockTransactionId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

/// Immutable audit record of a single inventory quantity change.
///
/// Created once per touched item per successful deduction or receipt; never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: StockTransactionId,
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub item_name: String,
    pub direction: StockDirection,
    pub quantity: Decimal,
    pub unit: String,
    pub reason: String,
    pub approval: ApprovalStatus,
    pub approved_by: Option<String>,
    /// Production run that caused the change, if any.
    pub reference: Option<AggregateId>,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// An approved OUT record for material consumed by production.
    pub fn consumption(
        item: &InventoryItem,
        quantity: Decimal,
        reason: impl Into<String>,
        approver: &str,
        reference: AggregateId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StockTransactionId::generate(),
            tenant_id: item.tenant_id(),
            item_id: item.id_typed(),
            item_name: item.name().to_string(),
            direction: StockDirection::Out,
            quantity,
            unit: item.unit().to_string(),
            reason: reason.into(),
            approval: ApprovalStatus::Approved,
            approved_by: Some(approver.to_string()),
            reference: Some(reference),
            created_at: at,
        }
    }

    /// An approved IN record for a stock receipt.
    pub fn receipt(
        item: &InventoryItem,
        quantity: Decimal,
        reason: impl Into<String>,
        approver: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StockTransactionId::generate(),
            tenant_id: item.tenant_id(),
            item_id: item.id_typed(),
            item_name: item.name().to_string(),
            direction: StockDirection::In,
            quantity,
            unit: item.unit().to_string(),
            reason: reason.into(),
            approval: ApprovalStatus::Approved,
            approved_by: Some(approver.to_string()),
            reference: None,
            created_at: at,
        }
    }

    /// Signed effect on the item's quantity.
    pub fn signed_quantity(&self) -> Decimal {
        match self.direction {
            StockDirection::In => self.quantity,
            StockDirection::Out => -self.quantity,
        }
    }
}
