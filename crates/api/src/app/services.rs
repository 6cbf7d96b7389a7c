use std::sync::Arc;
use std::thread;

use tracing::info;

use plantops_events::{Event, EventBus, InMemoryEventBus, Subscription};
use plantops_infra::config::PlantConfig;
use plantops_infra::notifications::BusNotificationDispatcher;
use plantops_infra::services::PlantServices;
use plantops_infra::store::InMemoryPlantStore;
use plantops_production::ProductionNotification;

pub type NotificationBus = Arc<InMemoryEventBus<ProductionNotification>>;
pub type AppStore = Arc<InMemoryPlantStore>;
pub type AppServices = PlantServices<AppStore, BusNotificationDispatcher<NotificationBus>>;

/// Wire the store, the notification bus and every service.
///
/// Notifications are drained by a background thread that logs them; a real
/// delivery channel (mail, push) would subscribe the same way.
pub fn build_services(config: &PlantConfig) -> AppServices {
    let store: AppStore = Arc::new(InMemoryPlantStore::new());
    let bus: NotificationBus = Arc::new(InMemoryEventBus::new());

    spawn_notification_logger(&bus);

    PlantServices::new(store, BusNotificationDispatcher::new(bus), config)
}

fn spawn_notification_logger(bus: &NotificationBus) {
    let sub: Subscription<ProductionNotification> = bus.subscribe();
    thread::spawn(move || {
        while let Ok(notification) = sub.recv() {
            info!(
                event_type = notification.event_type(),
                tenant = %notification.tenant_id(),
                occurred_at = %notification.occurred_at(),
                "{}",
                describe(&notification)
            );
        }
    });
}

fn describe(notification: &ProductionNotification) -> String {
    match notification {
        ProductionNotification::Completed {
            recipe_name,
            quantity,
            operator_name,
            ..
        } => format!("production completed: {recipe_name} x {quantity} by {operator_name}"),
        ProductionNotification::MaterialShortage { recipe_name, shortage, .. } => format!(
            "material shortage for {recipe_name}: {} needs {} {unit}, {} available",
            shortage.item_name,
            shortage.required,
            shortage.available,
            unit = shortage.unit
        ),
    }
}
