//! Operator context passed into every public entry point.

use serde::{Deserialize, Serialize};

use crate::id::{TenantId, UserId};

/// An already-authorized caller.
///
/// Authentication and permission checks happen upstream (gateway / HTTP
/// middleware). Holding an `OperatorContext` is the capability: services take
/// it explicitly and never consult ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorContext {
    tenant_id: TenantId,
    operator_id: UserId,
    operator_name: String,
}

impl OperatorContext {
    pub fn new(tenant_id: TenantId, operator_id: UserId, operator_name: impl Into<String>) -> Self {
        Self {
            tenant_id,
            operator_id,
            operator_name: operator_name.into(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn operator_id(&self) -> UserId {
        self.operator_id
    }

    pub fn operator_name(&self) -> &str {
        &self.operator_name
    }
}
