//! Out-of-band production notifications.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::{Shortage, TenantId};
use plantops_events::Event;

use crate::run::ProductionRunId;

/// Facts emitted after a production unit of work has settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductionNotification {
    Completed {
        tenant_id: TenantId,
        run_id: ProductionRunId,
        recipe_name: String,
        quantity: Decimal,
        operator_name: String,
        occurred_at: DateTime<Utc>,
    },
    MaterialShortage {
        tenant_id: TenantId,
        recipe_name: String,
        shortage: Shortage,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for ProductionNotification {
    fn event_type(&self) -> &'static str {
        match self {
            ProductionNotification::Completed { .. } => "production.run.completed",
            ProductionNotification::MaterialShortage { .. } => "production.material.shortage",
        }
    }

    fn tenant_id(&self) -> TenantId {
        match self {
            ProductionNotification::Completed { tenant_id, .. }
            | ProductionNotification::MaterialShortage { tenant_id, .. } => *tenant_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductionNotification::Completed { occurred_at, .. }
            | ProductionNotification::MaterialShortage { occurred_at, .. } => *occurred_at,
        }
    }
}

/// Fire-and-forget notification sink.
///
/// Implementations must not fail the caller: delivery problems are theirs to
/// log. Nothing is sent for an operation that did not succeed, except the
/// shortage signal, which describes the failure itself.
pub trait NotificationDispatcher: Send + Sync {
    fn notify_production_completed(
        &self,
        tenant_id: TenantId,
        run_id: ProductionRunId,
        recipe_name: &str,
        quantity: Decimal,
        operator_name: &str,
    );

    fn notify_material_shortage(&self, tenant_id: TenantId, recipe_name: &str, shortage: &Shortage);
}
