//! Request/response DTOs.
//!
//! Quantities travel as decimal strings; request bodies also accept JSON
//! numbers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::UserId;
use plantops_infra::services::{ConsumptionOutcome, SiloStatus};
use plantops_inventory::{
    InventoryItem, InventoryItemId, ItemType, StockTransaction, StorageKind, StorageLocation,
    StorageLocationId,
};
use plantops_production::{
    MaterialUsage, ProductionRun, ProductionRunId, Recipe, RecipeId, RecipeIngredient,
    RescheduleEntry, RunDetails, RunStatus,
};

// ---- recipes ----

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub product_code: String,
    pub name: String,
    pub ingredients: Vec<RecipeIngredient>,
}

#[derive(Debug, Deserialize)]
pub struct ReviseRecipeRequest {
    pub name: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: RecipeId,
    pub product_code: String,
    pub name: String,
    pub total_weight: Decimal,
    pub ingredients: Vec<RecipeIngredient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Recipe> for RecipeResponse {
    fn from(r: &Recipe) -> Self {
        Self {
            id: r.id_typed(),
            product_code: r.product_code().to_string(),
            name: r.name().to_string(),
            total_weight: r.total_weight(),
            ingredients: r.ingredients().to_vec(),
            created_at: r.created_at(),
            updated_at: r.updated_at(),
        }
    }
}

// ---- inventory ----

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub kind: StorageKind,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub id: StorageLocationId,
    pub name: String,
    pub kind: StorageKind,
    pub created_at: DateTime<Utc>,
}

impl From<&StorageLocation> for LocationResponse {
    fn from(l: &StorageLocation) -> Self {
        Self {
            id: l.id_typed(),
            name: l.name().to_string(),
            kind: l.kind(),
            created_at: l.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: InventoryItemId,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub item_type: ItemType,
    pub max_capacity: Option<Decimal>,
    pub location_id: Option<StorageLocationId>,
    pub unit_cost: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl From<&InventoryItem> for ItemResponse {
    fn from(i: &InventoryItem) -> Self {
        Self {
            id: i.id_typed(),
            name: i.name().to_string(),
            quantity: i.quantity(),
            unit: i.unit().to_string(),
            item_type: i.item_type(),
            max_capacity: i.max_capacity(),
            location_id: i.location_id(),
            unit_cost: i.unit_cost(),
            updated_at: i.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SiloResponse {
    pub id: StorageLocationId,
    pub name: String,
    pub cement: Option<ItemResponse>,
    pub fill_ratio: Option<Decimal>,
}

impl From<&SiloStatus> for SiloResponse {
    fn from(s: &SiloStatus) -> Self {
        Self {
            id: s.silo.id_typed(),
            name: s.silo.name().to_string(),
            cement: s.cement.as_ref().map(ItemResponse::from),
            fill_ratio: s.fill_ratio(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ReceiveStockResponse {
    pub item: ItemResponse,
    pub transaction: StockTransaction,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub item_id: Option<String>,
}

// ---- production ----

#[derive(Debug, Deserialize)]
pub struct ImmediateRunRequest {
    pub recipe_id: String,
    pub quantity: Decimal,
    pub silo_id: Option<String>,
    pub notes: Option<String>,
    pub client_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRunRequest {
    pub recipe_id: String,
    pub planned_quantity: Decimal,
    pub silo_id: String,
    pub scheduled_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub client_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRunRequest {
    pub new_date: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DelayRunRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRunRequest {
    pub actual_quantity: Decimal,
    /// Actual usage keyed by material label; omitted materials default to plan.
    #[serde(default)]
    pub actual_usage: BTreeMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub id: ProductionRunId,
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub product_code: String,
    pub silo_id: Option<StorageLocationId>,
    pub status: RunStatus,
    pub quantity: Decimal,
    pub planned_quantity: Option<Decimal>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub reschedule_history: Vec<RescheduleEntry>,
    pub delay_reason: Option<String>,
    pub cement_used: Decimal,
    pub operator_id: UserId,
    pub operator_name: String,
    #[serde(flatten)]
    pub details: RunDetails,
    pub usages: Vec<MaterialUsage>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&ProductionRun> for RunResponse {
    fn from(r: &ProductionRun) -> Self {
        use plantops_core::Versioned;

        Self {
            id: r.id_typed(),
            recipe_id: r.recipe_id(),
            recipe_name: r.recipe_name().to_string(),
            product_code: r.product_code().to_string(),
            silo_id: r.silo_id(),
            status: r.status(),
            quantity: r.quantity(),
            planned_quantity: r.planned_quantity(),
            scheduled_date: r.scheduled_date(),
            actual_start_time: r.actual_start_time(),
            actual_end_time: r.actual_end_time(),
            reschedule_history: r.reschedule_history().to_vec(),
            delay_reason: r.delay_reason().map(str::to_string),
            cement_used: r.cement_used(),
            operator_id: r.operator_id(),
            operator_name: r.operator_name().to_string(),
            details: r.details().clone(),
            usages: r.usages().to_vec(),
            version: r.version(),
            created_at: r.created_at(),
        }
    }
}

/// A committed run plus the stock transactions it wrote.
#[derive(Debug, Serialize)]
pub struct ConsumptionResponse {
    pub run: RunResponse,
    pub transactions: Vec<StockTransaction>,
}

impl From<&ConsumptionOutcome> for ConsumptionResponse {
    fn from(o: &ConsumptionOutcome) -> Self {
        Self {
            run: RunResponse::from(&o.run),
            transactions: o.transactions.clone(),
        }
    }
}

// ---- reports ----

#[derive(Debug, Deserialize)]
pub struct VarianceQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}
