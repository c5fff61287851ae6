use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::ChangeEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for per-resource change notifications. Stands in for
/// the datastore's change feed: subscribers re-run the slot and layout
/// queries from scratch whenever a resource's day changes.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<ChangeEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes for a resource. Creates the channel if needed.
    pub fn subscribe(&self, resource_id: Ulid) -> broadcast::Receiver<ChangeEvent> {
        let sender = self
            .channels
            .entry(resource_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish a change. No-op if nobody is listening.
    pub fn send(&self, resource_id: Ulid, event: &ChangeEvent) {
        if let Some(sender) = self.channels.get(&resource_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Drop a channel when its resource goes away.
    pub fn remove(&self, resource_id: &Ulid) {
        self.channels.remove(resource_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let rid = Ulid::new();
        let mut rx = hub.subscribe(rid);

        let event = ChangeEvent::ResourceCreated { resource_id: rid };
        hub.send(rid, &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let rid = Ulid::new();
        hub.send(rid, &ChangeEvent::ResourceDeleted { resource_id: rid });
    }
}
