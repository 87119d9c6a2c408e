//! # Broadcast Fan-out
//!
//! Service broadcasts handed to a connection reach the process-wide observer
//! registry, filtered and in priority order, with broken and stale listeners
//! evicted along the way.

#[cfg(test)]
mod tests {
    use crate::integration::harness::Harness;
    use parking_lot::Mutex;
    use shared_bus::{
        actions, global, ActionFilter, BroadcastEvent, BroadcastListener, ListenerError,
        RegistryConfig,
    };
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct Tagged {
        tag: &'static str,
        log: Arc<Mutex<Vec<(&'static str, String)>>>,
    }

    impl BroadcastListener for Tagged {
        fn on_broadcast(&self, event: &BroadcastEvent) -> Result<(), ListenerError> {
            let sku = event.extra("sku").unwrap_or_default().to_string();
            self.log.lock().push((self.tag, sku));
            Ok(())
        }
    }

    struct Broken;

    impl BroadcastListener for Broken {
        fn on_broadcast(&self, _event: &BroadcastEvent) -> Result<(), ListenerError> {
            Err(ListenerError::Rejected("cannot handle".into()))
        }
    }

    fn price_changed(sku: &str) -> BroadcastEvent {
        BroadcastEvent::new(actions::PRICE_CHANGED).with_extra("sku", sku)
    }

    /// The only test in this crate that touches the process-wide registry.
    #[tokio::test]
    async fn test_connection_broadcasts_reach_global_registry() {
        let harness = Harness::secured();
        global::shutdown();
        assert!(harness.connection.dispatch_broadcast(&price_changed("gold_pack")).is_none());

        let registry = global::init(RegistryConfig::for_testing()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let low = Arc::new(Tagged { tag: "low", log: log.clone() });
        let high = Arc::new(Tagged { tag: "high", log: log.clone() });
        let pings = Arc::new(Tagged { tag: "pings", log: log.clone() });
        let broken = Arc::new(Broken);
        registry.add_observer(&low, ActionFilter::action(actions::PRICE_CHANGED), 5);
        registry.add_observer(&high, ActionFilter::all(), 10);
        registry.add_observer(&pings, ActionFilter::action(actions::PING), 20);
        registry.add_observer(&broken, ActionFilter::all(), 0);

        let report = harness
            .connection
            .dispatch_broadcast(&price_changed("gold_pack"))
            .unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.evicted_faulted, 1);
        assert_eq!(
            *log.lock(),
            vec![("high", "gold_pack".to_string()), ("low", "gold_pack".to_string())]
        );

        // A dropped listener is evicted on the next pass.
        drop(low);
        let report = harness
            .connection
            .dispatch_broadcast(&price_changed("vip_monthly"))
            .unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted_dropped, 1);
        assert_eq!(registry.len(), 2);

        global::clear();
        assert!(registry.is_empty());
        assert!(global::shutdown());
    }

    #[test]
    fn test_untouched_listener_is_evicted_on_any_notify() {
        let registry = shared_bus::ObserverRegistry::new(RegistryConfig::with_timeout_secs(60));
        let log = Arc::new(Mutex::new(Vec::new()));
        let idle = Arc::new(Tagged { tag: "idle", log: log.clone() });
        let active = Arc::new(Tagged { tag: "active", log: log.clone() });
        registry.add_observer(&idle, ActionFilter::action(actions::PRICE_CHANGED), 0);
        registry.add_observer(&active, ActionFilter::all(), 0);
        let start = Instant::now();

        // Delivery refreshes only the listener that received the ping.
        let report = registry.notify_at(&BroadcastEvent::new(actions::PING), start + Duration::from_secs(40));
        assert_eq!(report.delivered, 1);

        let report = registry.notify_at(&BroadcastEvent::new(actions::PING), start + Duration::from_secs(61));
        assert_eq!(report.evicted_stale, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(log.lock().len(), 2);
        assert!(log.lock().iter().all(|(tag, _)| *tag == "active"));
    }
}
