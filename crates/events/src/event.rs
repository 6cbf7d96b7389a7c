use chrono::{DateTime, Utc};

use plantops_core::TenantId;

/// A domain-agnostic event.
///
/// Events are immutable facts about something that already happened.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "production.run.completed").
    fn event_type(&self) -> &'static str;

    /// Tenant the fact belongs to.
    fn tenant_id(&self) -> TenantId;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
