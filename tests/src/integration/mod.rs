//! # Integration Tests
//!
//! Real executors, parser and verifier behind a `BillingConnection`; only
//! the remote billing service is scripted.

pub mod broadcasts;
pub mod connection_lifecycle;
pub mod purchase_scenarios;

#[cfg(test)]
pub(crate) mod harness {
    use billing_telemetry::{init_logging, TelemetryConfig};
    use pk_03_signature_verification::testing::TEST_PUBLIC_KEY;
    use pk_05_billing_connection::testing::{Event, EventStream, MockBillingService, RecordingCallbacks};
    use pk_05_billing_connection::{BillingApi, BillingConfig, BillingConnection};
    use shared_types::SecurityCheck;
    use std::sync::Arc;

    pub struct Harness {
        pub connection: BillingConnection,
        pub service: Arc<MockBillingService>,
    }

    impl Harness {
        /// Security check enabled with the fixture key.
        pub fn secured() -> Self {
            Self::with_config(
                BillingConfig::for_testing().with_security_check(SecurityCheck::enabled(TEST_PUBLIC_KEY)),
            )
        }

        pub fn with_config(config: BillingConfig) -> Self {
            // Several tests share the process; only the first install wins.
            let _ = init_logging(&TelemetryConfig::for_testing());
            let service = Arc::new(MockBillingService::new());
            let connection = BillingConnection::new(config, service.clone()).unwrap();
            Self { connection, service }
        }

        pub async fn connect(&self) -> (Arc<RecordingCallbacks>, EventStream) {
            let (recorder, mut events) = RecordingCallbacks::new();
            self.connection.connect(recorder.clone());
            assert_eq!(events.next().await, Some(Event::ConnectionSucceeded));
            (recorder, events)
        }
    }
}
