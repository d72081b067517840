use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::identity::{IdentityProvider, MemoryIdentity, ServiceCredential};
use crate::models::event::OrderEvent;
use crate::observability::metrics::Metrics;
use crate::store::{MemoryStore, StoreBackend, StoreService};

pub struct AppState {
    pub store: StoreService,
    pub identity: Arc<dyn IdentityProvider>,
    pub service_credential: Option<ServiceCredential>,
    pub order_events_tx: broadcast::Sender<OrderEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: &Config,
        backend: Box<dyn StoreBackend>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let metrics = Metrics::new();
        let (order_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            store: StoreService::new(backend, config.store_timeout, metrics.clone()),
            identity,
            service_credential: config.service_role_key.clone(),
            order_events_tx,
            metrics,
        }
    }

    /// State over the in-process store and identity provider. The identity
    /// handle is returned as well so callers can register accounts.
    pub fn in_memory(config: &Config) -> (Self, Arc<MemoryIdentity>) {
        let identity = Arc::new(MemoryIdentity::new(config.service_role_key.clone()));
        let state = Self::new(config, Box::new(MemoryStore::new()), identity.clone());
        (state, identity)
    }

    pub fn publish(&self, event: OrderEvent) {
        let _ = self.order_events_tx.send(event);
    }
}
