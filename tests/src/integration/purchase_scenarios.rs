//! # Purchase Scenarios
//!
//! ```text
//! purchase() ──▶ [Background] ──intent──▶ [Billing service]
//!                                              │ user finishes flow
//!                                              ▼
//!                [Background] ◀──RawResult─────┘
//!                    │ parse + verify
//!                    ▼
//!                 [Main context] ──▶ PurchaseCallback
//! ```
//!
//! ## Test Categories
//!
//! 1. **Verified purchase**: valid signature reaches `purchase_succeeded`
//! 2. **Tampering**: hijack is reported and never retried
//! 3. **Non-OK result**: payload is never read
//! 4. **Generation change**: late results after `disconnect()` are dropped

#[cfg(test)]
use super::harness::Harness;

#[cfg(test)]
mod tests {
    use super::*;
    use pk_02_retry_policy::{Backoff, RetryPolicy};
    use pk_03_signature_verification::testing::*;
    use pk_03_signature_verification::VerificationMode;
    use pk_04_result_parser::{ResultParser, ResultParserApi};
    use pk_05_billing_connection::testing::Event;
    use pk_05_billing_connection::{BillingApi, BillingConfig};
    use shared_types::{
        BillingError, Operation, PurchaseRequest, PurchaseState, PurchaseType, RawResult,
        ResponseCode, SecurityCheck,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn request() -> PurchaseRequest {
        PurchaseRequest::new("gold_pack").unwrap()
    }

    #[tokio::test]
    async fn test_verified_purchase_is_delivered() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA1));

        let Some(Event::PurchaseSucceeded(purchase)) = events.next().await else {
            panic!("expected a verified purchase");
        };
        assert_eq!(purchase.purchase_state(), PurchaseState::Purchased);
        assert_eq!(purchase.order_id(), "GPA.1234-5678");
        assert_eq!(purchase.payload(), "payload-1");
        assert_eq!(purchase.package_name(), "com.example.app");
        assert_eq!(purchase.purchase_time().timestamp_millis(), 1_691_234_567_890);
        assert_eq!(purchase.data_signature(), SIGNED_PURCHASE_SHA1);
    }

    #[tokio::test]
    async fn test_freshly_signed_refund_reports_refunded() {
        let signer = TestSigner::new();
        let data = serde_json::json!({
            "orderId": "GPA.9000",
            "purchaseToken": "tok-fresh",
            "purchaseState": 1,
            "purchaseTime": 1_700_000_000_000u64,
            "productId": "gold_pack",
        })
        .to_string();
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness
            .service
            .complete_purchase(RawResult::ok(data.clone(), signer.sign_sha1(&data)));

        let Some(Event::PurchaseSucceeded(purchase)) = events.next().await else {
            panic!("expected a purchase");
        };
        assert_eq!(purchase.purchase_state(), PurchaseState::Refunded);
        assert!(!purchase.is_purchased());
        assert_eq!(purchase.original_raw_payload(), data);
    }

    #[tokio::test]
    async fn test_tampered_signature_is_hijack() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness.service.complete_purchase(RawResult::ok(
            SIGNED_PURCHASE_DATA,
            tamper_signature(SIGNED_PURCHASE_SHA1),
        ));

        let Some(Event::PurchaseFailed(error)) = events.next().await else {
            panic!("expected a failure");
        };
        assert_eq!(error, BillingError::PurchaseHijacked);
        assert!(error.is_security_event());
        assert!(!error.is_retryable());
        assert_eq!(events.next_within(Duration::from_millis(200)).await, None);
    }

    #[tokio::test]
    async fn test_backoff_never_retries_hijack() {
        let parser = ResultParser::new(SecurityCheck::enabled(TEST_PUBLIC_KEY));
        let mut backoff = Backoff::new(RetryPolicy::for_testing());
        let fetches = AtomicU32::new(0);

        let result = parser
            .parse_with_retry(&mut backoff, Operation::Purchase, |_| {
                fetches.fetch_add(1, Ordering::SeqCst);
                async {
                    Ok(RawResult::ok(
                        SIGNED_PURCHASE_DATA,
                        tamper_signature(SIGNED_PURCHASE_SHA1),
                    ))
                }
            })
            .await;

        assert_eq!(result, Err(BillingError::PurchaseHijacked));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(backoff.attempt(), 1);
    }

    #[tokio::test]
    async fn test_backoff_reverifies_after_transient_failure() {
        let parser = ResultParser::new(SecurityCheck::enabled(TEST_PUBLIC_KEY));
        let mut backoff = Backoff::new(RetryPolicy::for_testing());

        let result = parser
            .parse_with_retry(&mut backoff, Operation::Purchase, |attempt| async move {
                if attempt == 0 {
                    Err(BillingError::Disconnected)
                } else {
                    Ok(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA1))
                }
            })
            .await;

        assert_eq!(result.unwrap().product_id(), "gold_pack");
        assert_eq!(backoff.attempt(), 2);
    }

    #[tokio::test]
    async fn test_non_ok_result_skips_payload() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness.service.complete_purchase(RawResult {
            response_code: ResponseCode::Error.as_i32(),
            purchase_data: Some("{ not json".to_string()),
            data_signature: Some("garbage".to_string()),
        });

        assert_eq!(
            events.next().await,
            Some(Event::PurchaseFailed(BillingError::ResultNotOkay {
                code: ResponseCode::Error
            }))
        );
    }

    #[tokio::test]
    async fn test_result_after_disconnect_is_dropped() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness.connection.disconnect();
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA1));

        assert_eq!(events.next_within(Duration::from_millis(300)).await, None);
    }

    #[tokio::test]
    async fn test_result_from_previous_session_is_dropped_after_reconnect() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;
        harness.connection.purchase(request(), PurchaseType::InApp, recorder.clone());
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));

        harness.connection.disconnect();
        let (recorder, mut fresh) = harness.connect().await;
        harness
            .connection
            .purchase(PurchaseRequest::new("vip_monthly").unwrap(), PurchaseType::Subscription, recorder);
        assert_eq!(fresh.next().await, Some(Event::PurchaseFlowBegan));

        // The old flow finishes first, then the new one.
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA1));
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_SUBSCRIPTION_DATA, SIGNED_SUBSCRIPTION_SHA1));

        let Some(Event::PurchaseSucceeded(purchase)) = fresh.next().await else {
            panic!("expected the new session's purchase");
        };
        assert_eq!(purchase.product_id(), "vip_monthly");
        assert_eq!(events.next_within(Duration::from_millis(200)).await, None);
        assert_eq!(fresh.next_within(Duration::from_millis(200)).await, None);
    }

    #[tokio::test]
    async fn test_fallback_mode_accepts_migrated_signer() {
        let config = BillingConfig {
            verification_mode: VerificationMode::WithFallback,
            ..BillingConfig::for_testing().with_security_check(SecurityCheck::enabled(TEST_PUBLIC_KEY))
        };
        let harness = Harness::with_config(config);
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA256));

        assert!(matches!(events.next().await, Some(Event::PurchaseSucceeded(_))));
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_migrated_signer() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder);
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA256));

        assert_eq!(events.next().await, Some(Event::PurchaseFailed(BillingError::PurchaseHijacked)));
    }

    #[tokio::test]
    async fn test_purchase_then_consume() {
        let harness = Harness::secured();
        let (recorder, mut events) = harness.connect().await;

        harness.connection.purchase(request(), PurchaseType::InApp, recorder.clone());
        assert_eq!(events.next().await, Some(Event::PurchaseFlowBegan));
        harness
            .service
            .complete_purchase(RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA1));
        let Some(Event::PurchaseSucceeded(purchase)) = events.next().await else {
            panic!("expected a purchase");
        };

        harness.connection.consume(purchase.purchase_token(), recorder);

        assert_eq!(events.next().await, Some(Event::ConsumeSucceeded));
        assert_eq!(harness.service.consumed(), vec!["tok-abc123".to_string()]);
    }
}
