//! Process-local notification fan-out.
//!
//! One plant process publishes run completions and material shortages here;
//! the API's notification logger and any test harness subscribe. Nothing
//! leaves the process and nothing survives a restart.

use std::sync::{Mutex, mpsc};

use tracing::trace;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, thiserror::Error)]
pub enum InMemoryBusError {
    #[error("subscriber list lock poisoned")]
    Poisoned,
}

/// Fans each published notification out to every live subscription.
///
/// Each subscription owns the receiving half of an `mpsc` channel. A send
/// that fails means the receiver was dropped, so that sender is forgotten
/// during the same publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    senders: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscriptions as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut senders = self.senders.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let before = senders.len();
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        let gone = before - senders.len();
        if gone > 0 {
            trace!(gone, remaining = senders.len(), "dropped closed notification subscribers");
        }

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        // Poisoned: the subscription is returned but never fed.
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(tx);
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Signal {
        RunCompleted(u32),
        Shortage(&'static str),
    }

    #[test]
    fn every_subscriber_receives_published_notifications() {
        let bus = InMemoryEventBus::<Signal>::new();
        let logger = bus.subscribe();
        let dashboard = bus.subscribe();

        bus.publish(Signal::RunCompleted(7)).unwrap();

        assert_eq!(logger.recv_timeout(Duration::from_millis(100)).unwrap(), Signal::RunCompleted(7));
        assert_eq!(dashboard.recv_timeout(Duration::from_millis(100)).unwrap(), Signal::RunCompleted(7));
    }

    #[test]
    fn closed_subscriptions_are_forgotten_on_publish() {
        let bus = InMemoryEventBus::<Signal>::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(Signal::Shortage("cement")).unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), Signal::Shortage("cement"));
    }

    #[test]
    fn late_subscribers_miss_earlier_notifications() {
        let bus = InMemoryEventBus::<Signal>::new();
        bus.publish(Signal::RunCompleted(1)).unwrap();

        let late = bus.subscribe();
        bus.publish(Signal::RunCompleted(2)).unwrap();

        assert_eq!(late.try_recv().unwrap(), Signal::RunCompleted(2));
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn publishing_with_nobody_listening_succeeds() {
        let bus = InMemoryEventBus::<Signal>::new();
        assert!(bus.publish(Signal::Shortage("water")).is_ok());
    }
}
