//! Notification dispatch over the event bus.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use plantops_core::{Shortage, TenantId};
use plantops_events::{Event, EventBus};
use plantops_production::{NotificationDispatcher, ProductionNotification, ProductionRunId};

/// Publishes [`ProductionNotification`]s onto a bus.
///
/// Publish failures are logged and swallowed.
#[derive(Debug, Clone)]
pub struct BusNotificationDispatcher<B> {
    bus: B,
}

impl<B> BusNotificationDispatcher<B>
where
    B: EventBus<ProductionNotification>,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn publish(&self, notification: ProductionNotification) {
        let event_type = notification.event_type();
        let tenant_id = notification.tenant_id();
        match self.bus.publish(notification) {
            Ok(()) => debug!(event_type, tenant = %tenant_id, "notification published"),
            Err(e) => warn!(event_type, tenant = %tenant_id, error = ?e, "notification publish failed"),
        }
    }
}

impl<B> NotificationDispatcher for BusNotificationDispatcher<B>
where
    B: EventBus<ProductionNotification>,
{
    fn notify_production_completed(
        &self,
        tenant_id: TenantId,
        run_id: ProductionRunId,
        recipe_name: &str,
        quantity: Decimal,
        operator_name: &str,
    ) {
        self.publish(ProductionNotification::Completed {
            tenant_id,
            run_id,
            recipe_name: recipe_name.to_string(),
            quantity,
            operator_name: operator_name.to_string(),
            occurred_at: Utc::now(),
        });
    }

    fn notify_material_shortage(&self, tenant_id: TenantId, recipe_name: &str, shortage: &Shortage) {
        self.publish(ProductionNotification::MaterialShortage {
            tenant_id,
            recipe_name: recipe_name.to_string(),
            shortage: shortage.clone(),
            occurred_at: Utc::now(),
        });
    }
}

/// Dispatcher that drops everything; for deployments without a consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifications;

impl NotificationDispatcher for NoopNotifications {
    fn notify_production_completed(&self, _: TenantId, _: ProductionRunId, _: &str, _: Decimal, _: &str) {}

    fn notify_material_shortage(&self, _: TenantId, _: &str, _: &Shortage) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantops_events::{InMemoryEventBus, Subscription};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[derive(Debug)]
    struct ClosedBus;

    impl EventBus<ProductionNotification> for ClosedBus {
        type Error = &'static str;

        fn publish(&self, _: ProductionNotification) -> Result<(), Self::Error> {
            Err("closed")
        }

        fn subscribe(&self) -> Subscription<ProductionNotification> {
            let (_tx, rx) = std::sync::mpsc::channel();
            Subscription::new(rx)
        }
    }

    #[test]
    fn completion_reaches_subscribers() {
        let bus: Arc<InMemoryEventBus<ProductionNotification>> = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let dispatcher = BusNotificationDispatcher::new(bus);
        let tenant = TenantId::new();

        dispatcher.notify_production_completed(tenant, ProductionRunId::generate(), "C25/30", dec!(20), "Ahmed");

        match sub.try_recv().unwrap() {
            ProductionNotification::Completed { recipe_name, quantity, .. } => {
                assert_eq!(recipe_name, "C25/30");
                assert_eq!(quantity, dec!(20));
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[test]
    fn publish_failure_is_swallowed() {
        let dispatcher = BusNotificationDispatcher::new(ClosedBus);
        let shortage = Shortage {
            item_name: "Silo A cement".into(),
            required: dec!(6000),
            available: dec!(5000),
            unit: "kg".into(),
        };
        dispatcher.notify_material_shortage(TenantId::new(), "C25/30", &shortage);
    }
}
