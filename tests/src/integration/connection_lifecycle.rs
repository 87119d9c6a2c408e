//! # Connection Lifecycle Tests
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──bound──▶ Connected
//!                               │                     │
//!                           bind failed          service lost
//!                               ▼                     ▼
//!                        FailedToConnect         Disconnected
//! ```
//!
//! Exercised with the pooled background executor as well as the serial one,
//! so outcomes may be produced concurrently.

#[cfg(test)]
use super::harness::Harness;

#[cfg(test)]
mod tests {
    use super::*;
    use pk_01_task_executors::ExecutorMode;
    use pk_03_signature_verification::testing::*;
    use pk_05_billing_connection::testing::{Event, RecordingCallbacks};
    use pk_05_billing_connection::{BillingApi, BillingConfig, GatewayError};
    use shared_types::{
        BillingError, ConnectionState, PurchaseRequest, PurchaseType, RawPurchaseList, RawResult,
        ResponseCode, SecurityCheck,
    };
    use std::time::Duration;

    fn pooled() -> Harness {
        Harness::with_config(BillingConfig {
            background_mode: ExecutorMode::Pooled,
            ..BillingConfig::for_testing().with_security_check(SecurityCheck::enabled(TEST_PUBLIC_KEY))
        })
    }

    #[tokio::test]
    async fn test_many_connects_bind_once() {
        let harness = Harness::secured();
        harness.service.hold_binds();
        let mut streams = Vec::new();
        for _ in 0..10 {
            let (recorder, events) = RecordingCallbacks::new();
            harness.connection.connect(recorder);
            streams.push(events);
        }
        assert_eq!(harness.connection.state(), ConnectionState::Connecting);

        harness.service.release_bind();

        for events in &mut streams {
            assert_eq!(events.next().await, Some(Event::ConnectionSucceeded));
        }
        assert_eq!(harness.service.bind_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_from_every_state_is_disconnected() {
        let harness = Harness::secured();
        harness.connection.disconnect();
        assert_eq!(harness.connection.state(), ConnectionState::Disconnected);

        harness.service.hold_binds();
        let (recorder, mut events) = RecordingCallbacks::new();
        harness.connection.connect(recorder);
        harness.connection.disconnect();
        assert_eq!(harness.connection.state(), ConnectionState::Disconnected);
        harness.service.release_bind();
        assert_eq!(events.next_within(Duration::from_millis(200)).await, None);

        let harness = Harness::secured();
        harness.connect().await;
        harness.connection.disconnect();
        assert_eq!(harness.connection.state(), ConnectionState::Disconnected);

        let harness = Harness::secured();
        harness.service.set_api_version(1);
        let (recorder, mut events) = RecordingCallbacks::new();
        harness.connection.connect(recorder);
        assert!(matches!(events.next().await, Some(Event::ConnectionFailed(_))));
        assert_eq!(harness.connection.state(), ConnectionState::FailedToConnect);
        harness.connection.disconnect();
        assert_eq!(harness.connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_connect_can_be_retried() {
        let harness = Harness::secured();
        harness.service.fail_binds(GatewayError::BindFailed("not installed".into()));
        let (recorder, mut events) = RecordingCallbacks::new();
        harness.connection.connect(recorder.clone());
        assert!(matches!(events.next().await, Some(Event::ConnectionFailed(_))));
        assert_eq!(harness.service.bind_count(), 1);

        let harness = Harness::secured();
        harness.service.set_api_version(2);
        let (recorder, mut events) = RecordingCallbacks::new();
        harness.connection.connect(recorder.clone());
        assert_eq!(
            events.next().await,
            Some(Event::ConnectionFailed(BillingError::ServiceNotSupported))
        );

        harness.service.set_api_version(9);
        harness.connection.connect(recorder);
        assert_eq!(events.next().await, Some(Event::ConnectionSucceeded));
        assert_eq!(harness.service.bind_count(), 2);
    }

    #[tokio::test]
    async fn test_operations_issued_while_connecting_run_in_order() {
        let harness = Harness::secured();
        harness.service.hold_binds();
        let (recorder, mut events) = RecordingCallbacks::new();
        harness.connection.connect(recorder.clone());
        for token in ["tok-1", "tok-2", "tok-3"] {
            harness.connection.consume(token, recorder.clone());
        }

        harness.service.release_bind();

        assert_eq!(events.next().await, Some(Event::ConnectionSucceeded));
        for _ in 0..3 {
            assert_eq!(events.next().await, Some(Event::ConsumeSucceeded));
        }
        assert_eq!(harness.service.consumed(), vec!["tok-1", "tok-2", "tok-3"]);
    }

    #[tokio::test]
    async fn test_service_loss_fails_everything_in_flight() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;
        harness.service.stall_calls(true);
        harness.connection.consume("tok-1", recorder.clone());
        harness.connection.query_purchased(PurchaseType::InApp, recorder.clone());
        assert_eq!(harness.connection.in_flight(), 2);

        harness.connection.on_service_lost();

        let mut failures = 0;
        let mut disconnected = 0;
        for _ in 0..3 {
            match events.next().await {
                Some(Event::ConsumeFailed(BillingError::Disconnected))
                | Some(Event::QueryFailed(BillingError::Disconnected)) => failures += 1,
                Some(Event::Disconnected) => disconnected += 1,
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!((failures, disconnected), (2, 1));
        assert_eq!(harness.connection.state(), ConnectionState::Disconnected);

        harness.service.stall_calls(false);
        harness.connect().await;
        harness.connection.consume("tok-2", recorder);
        assert_eq!(events.next().await, Some(Event::ConsumeSucceeded));
    }

    #[tokio::test]
    async fn test_pooled_operations_each_complete_once() {
        let harness = pooled();
        let (recorder, mut events) = harness.connect().await;
        harness.service.set_purchase_pages(vec![RawPurchaseList {
            response_code: 0,
            purchase_data_list: vec![SIGNED_PURCHASE_DATA.to_string()],
            signature_list: vec![SIGNED_PURCHASE_SHA1.to_string()],
            continuation_token: None,
        }]);

        for i in 0..8 {
            harness.connection.consume(&format!("tok-{i}"), recorder.clone());
            harness.connection.query_purchased(PurchaseType::InApp, recorder.clone());
        }

        let mut consumed = 0;
        let mut queried = 0;
        for _ in 0..16 {
            match events.next().await {
                Some(Event::ConsumeSucceeded) => consumed += 1,
                Some(Event::QuerySucceeded(purchases)) => {
                    assert_eq!(purchases.len(), 1);
                    queried += 1;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!((consumed, queried), (8, 8));
        assert_eq!(events.next_within(Duration::from_millis(200)).await, None);
        assert_eq!(harness.connection.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_pooled_purchases_resolve_independently() {
        let harness = pooled();
        let (first, mut first_events) = harness.connect().await;
        let (second, mut second_events) = RecordingCallbacks::new();

        harness
            .connection
            .purchase(PurchaseRequest::new("gold_pack").unwrap(), PurchaseType::InApp, first);
        assert_eq!(first_events.next().await, Some(Event::PurchaseFlowBegan));
        harness.connection.subscribe(PurchaseRequest::new("vip_monthly").unwrap(), second);
        assert_eq!(second_events.next().await, Some(Event::PurchaseFlowBegan));
        assert_eq!(harness.service.open_flows(), 2);

        // The service finishes flows oldest first; the user cancels the first.
        harness
            .service
            .complete_purchase(RawResult::with_code(ResponseCode::UserCanceled));
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_SUBSCRIPTION_DATA, SIGNED_SUBSCRIPTION_SHA1));

        assert!(matches!(second_events.next().await, Some(Event::PurchaseSucceeded(_))));
        assert_eq!(first_events.next().await, Some(Event::PurchaseCanceled));
    }

    #[tokio::test]
    async fn test_shutdown_disconnects() {
        let harness = Harness::secured();
        harness.connect().await;

        harness.connection.shutdown();

        assert_eq!(harness.connection.state(), ConnectionState::Disconnected);
        assert_eq!(harness.service.unbind_count(), 1);
    }
}
