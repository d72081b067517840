use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub order_transitions_total: IntCounterVec,
    pub order_conflicts_total: IntCounterVec,
    pub fleet_invites_total: IntCounterVec,
    pub store_latency_seconds: HistogramVec,
    pub store_timeouts_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created by SMEs")
                .expect("valid orders_created_total metric");

        let order_transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Committed order status changes by target status",
            ),
            &["to"],
        )
        .expect("valid order_transitions_total metric");

        let order_conflicts_total = IntCounterVec::new(
            Opts::new(
                "order_conflicts_total",
                "Order writes rejected because the order was no longer in the expected state",
            ),
            &["operation"],
        )
        .expect("valid order_conflicts_total metric");

        let fleet_invites_total = IntCounterVec::new(
            Opts::new("fleet_invites_total", "Fleet invites by outcome"),
            &["outcome"],
        )
        .expect("valid fleet_invites_total metric");

        let store_latency_seconds = HistogramVec::new(
            HistogramOpts::new("store_latency_seconds", "Latency of store calls in seconds"),
            &["operation"],
        )
        .expect("valid store_latency_seconds metric");

        let store_timeouts_total =
            IntCounter::new("store_timeouts_total", "Store calls abandoned on timeout")
                .expect("valid store_timeouts_total metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(order_conflicts_total.clone()))
            .expect("register order_conflicts_total");
        registry
            .register(Box::new(fleet_invites_total.clone()))
            .expect("register fleet_invites_total");
        registry
            .register(Box::new(store_latency_seconds.clone()))
            .expect("register store_latency_seconds");
        registry
            .register(Box::new(store_timeouts_total.clone()))
            .expect("register store_timeouts_total");

        Self {
            registry,
            orders_created_total,
            order_transitions_total,
            order_conflicts_total,
            fleet_invites_total,
            store_latency_seconds,
            store_timeouts_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
