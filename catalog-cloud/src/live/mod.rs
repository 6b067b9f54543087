//! LiveHub: best-effort catalog change notifications
//!
//! ```text
//! services (product / category / client writes)
//!       │ LiveEvent { event, client_id, payload }
//!       ▼
//! LiveHub
//!   ├── all: Sender<LiveEvent>             every event
//!   └── clients: client_id → Sender        events scoped to one tenant
//!             │
//!             ▼
//!   live WS handler (subscribe → forward as JSON text frames)
//! ```
//!
//! Delivery is at-most-once: nothing is persisted, lagging subscribers
//! lose events, and sending with no subscribers is not an error.

use dashmap::DashMap;
use serde::Serialize;
use shared::models::{Product, ProductAction, ProductChange};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const PRODUCT_UPDATED: &str = "product:updated";
pub const CATEGORY_UPDATED: &str = "category:updated";
pub const CLIENT_UPDATED: &str = "client:updated";

/// Event pushed to live subscribers
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    pub payload: serde_json::Value,
}

#[derive(Clone)]
pub struct LiveHub {
    capacity: usize,
    all: broadcast::Sender<LiveEvent>,
    clients: Arc<DashMap<Uuid, broadcast::Sender<LiveEvent>>>,
}

impl LiveHub {
    pub fn new(capacity: usize) -> Self {
        let (all, _) = broadcast::channel(capacity);
        Self {
            capacity,
            all,
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Subscribe to every event, or only to one client's events
    pub fn subscribe(&self, client_id: Option<Uuid>) -> broadcast::Receiver<LiveEvent> {
        match client_id {
            None => self.all.subscribe(),
            Some(id) => self
                .clients
                .entry(id)
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe(),
        }
    }

    /// Fire-and-forget broadcast; returns how many subscribers received it
    pub fn broadcast(
        &self,
        event: &'static str,
        client_id: Option<Uuid>,
        payload: impl Serialize,
    ) -> usize {
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(event, error = %e, "Live event payload not serializable");
                return 0;
            }
        };
        let live = LiveEvent {
            event,
            client_id,
            payload,
        };

        let mut delivered = self.all.send(live.clone()).unwrap_or(0);
        if let Some(id) = client_id {
            if let Some(tx) = self.clients.get(&id) {
                delivered += tx.send(live).unwrap_or(0);
            }
            self.clients.remove_if(&id, |_, tx| tx.receiver_count() == 0);
        }
        delivered
    }

    /// `product:updated` with `{action, product}`
    pub fn product_changed(&self, action: ProductAction, product: &Product) -> usize {
        self.broadcast(
            PRODUCT_UPDATED,
            Some(product.client_id),
            ProductChange {
                action,
                product: product.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_subscribers() {
        let hub = LiveHub::new(8);
        assert_eq!(hub.broadcast(CLIENT_UPDATED, None, "x"), 0);
    }

    #[tokio::test]
    async fn test_client_scoped_subscription() {
        let hub = LiveHub::new(8);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut all_rx = hub.subscribe(None);
        let mut a_rx = hub.subscribe(Some(a));

        hub.broadcast(CATEGORY_UPDATED, Some(b), serde_json::json!({"n": 1}));
        hub.broadcast(CATEGORY_UPDATED, Some(a), serde_json::json!({"n": 2}));

        assert_eq!(all_rx.recv().await.unwrap().payload["n"], 1);
        assert_eq!(all_rx.recv().await.unwrap().payload["n"], 2);
        let scoped = a_rx.recv().await.unwrap();
        assert_eq!(scoped.payload["n"], 2);
        assert_eq!(scoped.client_id, Some(a));
    }

    #[tokio::test]
    async fn test_product_changed_payload() {
        let hub = LiveHub::new(8);
        let mut rx = hub.subscribe(None);
        let product = Product::new(Uuid::new_v4(), "Chia", "chia");

        assert_eq!(hub.product_changed(ProductAction::Create, &product), 1);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, PRODUCT_UPDATED);
        assert_eq!(event.payload["action"], "create");
        assert_eq!(event.payload["product"]["slug"], "chia");
    }

    #[test]
    fn test_idle_client_channel_is_dropped() {
        let hub = LiveHub::new(8);
        let id = Uuid::new_v4();
        drop(hub.subscribe(Some(id)));
        hub.broadcast(CLIENT_UPDATED, Some(id), "x");
        assert!(hub.clients.get(&id).is_none());
    }
}
