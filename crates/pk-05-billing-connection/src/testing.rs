//! # Test Doubles
//!
//! - `MockBillingService`: a scripted gateway. Counts binds, can hold binds
//!   until released, keeps purchase flows open until the test completes them,
//!   and can stall or fail any call.
//! - `RecordingCallbacks`: implements every callback trait and forwards each
//!   outcome to a channel read through `EventStream`.

use crate::callbacks::{
    ConnectionCallback, ConsumeCallback, PurchaseCallback, PurchaseQueryCallback,
    SkuDetailsCallback, TrialSubscriptionCallback,
};
use crate::ports::outbound::{BillingServiceGateway, GatewayError, PurchaseOutcome};
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use pk_04_result_parser::PurchaseInfo;
use shared_types::{
    BillingError, PurchaseIntentRequest, PurchaseType, RawPurchaseList, RawResult,
    RawSkuDetailsList, RawTrialResult, ResponseCode, ServiceBinding, SkuDetails,
    TrialSubscriptionInfo,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Semaphore};

// =============================================================================
// MOCK BILLING SERVICE
// =============================================================================

pub struct MockBillingService {
    api_version: AtomicU32,
    billing_supported: Mutex<ResponseCode>,
    bind_error: Mutex<Option<GatewayError>>,
    hold_binds: AtomicBool,
    bind_gate: Semaphore,
    binds: AtomicU32,
    unbinds: AtomicU32,
    stall: AtomicBool,
    next_error: Mutex<Option<GatewayError>>,
    purchase_requests: Mutex<Vec<PurchaseIntentRequest>>,
    open_flows: Mutex<VecDeque<oneshot::Sender<Result<RawResult, GatewayError>>>>,
    consume_answers: Mutex<VecDeque<Result<ResponseCode, GatewayError>>>,
    consumed: Mutex<Vec<String>>,
    purchase_pages: Mutex<Vec<RawPurchaseList>>,
    page_failures: AtomicU32,
    page_requests: AtomicU32,
    sku_details: Mutex<RawSkuDetailsList>,
    sku_requests: Mutex<Vec<Vec<String>>>,
    trial: Mutex<RawTrialResult>,
}

impl Default for MockBillingService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBillingService {
    /// A service at API version 9 that supports billing and owns nothing.
    pub fn new() -> Self {
        Self {
            api_version: AtomicU32::new(9),
            billing_supported: Mutex::new(ResponseCode::Ok),
            bind_error: Mutex::new(None),
            hold_binds: AtomicBool::new(false),
            bind_gate: Semaphore::new(0),
            binds: AtomicU32::new(0),
            unbinds: AtomicU32::new(0),
            stall: AtomicBool::new(false),
            next_error: Mutex::new(None),
            purchase_requests: Mutex::new(Vec::new()),
            open_flows: Mutex::new(VecDeque::new()),
            consume_answers: Mutex::new(VecDeque::new()),
            consumed: Mutex::new(Vec::new()),
            purchase_pages: Mutex::new(Vec::new()),
            page_failures: AtomicU32::new(0),
            page_requests: AtomicU32::new(0),
            sku_details: Mutex::new(RawSkuDetailsList::default()),
            sku_requests: Mutex::new(Vec::new()),
            trial: Mutex::new(RawTrialResult {
                response_code: 0,
                trial_data: Some(r#"{"isAvailable":false,"trialPeriodDays":0}"#.to_string()),
            }),
        }
    }

    pub fn set_api_version(&self, version: u32) {
        self.api_version.store(version, Ordering::SeqCst);
    }

    pub fn set_billing_supported(&self, code: ResponseCode) {
        *self.billing_supported.lock() = code;
    }

    pub fn fail_binds(&self, error: GatewayError) {
        *self.bind_error.lock() = Some(error);
    }

    /// Make every bind wait for [`release_bind`](Self::release_bind).
    pub fn hold_binds(&self) {
        self.hold_binds.store(true, Ordering::SeqCst);
    }

    pub fn release_bind(&self) {
        self.bind_gate.add_permits(1);
    }

    pub fn bind_count(&self) -> u32 {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn unbind_count(&self) -> u32 {
        self.unbinds.load(Ordering::SeqCst)
    }

    /// Make every call except bind hang until it times out.
    pub fn stall_calls(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    /// Fail the next non-bind call with `error`.
    pub fn fail_next_call(&self, error: GatewayError) {
        *self.next_error.lock() = Some(error);
    }

    pub fn purchase_requests(&self) -> Vec<PurchaseIntentRequest> {
        self.purchase_requests.lock().clone()
    }

    pub fn open_flows(&self) -> usize {
        self.open_flows.lock().len()
    }

    /// Finish the oldest open purchase flow with `raw`.
    pub fn complete_purchase(&self, raw: RawResult) -> bool {
        self.finish_flow(Ok(raw))
    }

    /// Drop the oldest open purchase flow as if the service died.
    pub fn lose_purchase(&self) -> bool {
        self.finish_flow(Err(GatewayError::ServiceLost))
    }

    fn finish_flow(&self, outcome: Result<RawResult, GatewayError>) -> bool {
        match self.open_flows.lock().pop_front() {
            Some(flow) => flow.send(outcome).is_ok(),
            None => false,
        }
    }

    pub fn push_consume_answer(&self, answer: Result<ResponseCode, GatewayError>) {
        self.consume_answers.lock().push_back(answer);
    }

    pub fn consumed(&self) -> Vec<String> {
        self.consumed.lock().clone()
    }

    /// Serve these pages in order, linking them with continuation tokens.
    pub fn set_purchase_pages(&self, mut pages: Vec<RawPurchaseList>) {
        let count = pages.len();
        for (index, page) in pages.iter_mut().enumerate() {
            page.continuation_token = (index + 1 < count).then(|| format!("page-{}", index + 1));
        }
        *self.purchase_pages.lock() = pages;
    }

    /// Fail the next `count` page fetches with a remote error.
    pub fn fail_page_fetches(&self, count: u32) {
        self.page_failures.store(count, Ordering::SeqCst);
    }

    pub fn page_requests(&self) -> u32 {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn set_sku_details(&self, details: RawSkuDetailsList) {
        *self.sku_details.lock() = details;
    }

    pub fn sku_requests(&self) -> Vec<Vec<String>> {
        self.sku_requests.lock().clone()
    }

    pub fn set_trial(&self, trial: RawTrialResult) {
        *self.trial.lock() = trial;
    }

    async fn before_call(&self) -> Result<(), GatewayError> {
        if let Some(error) = self.next_error.lock().take() {
            return Err(error);
        }
        if self.stall.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait]
impl BillingServiceGateway for MockBillingService {
    async fn bind(&self) -> Result<ServiceBinding, GatewayError> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        if self.hold_binds.load(Ordering::SeqCst) {
            let permit = self
                .bind_gate
                .acquire()
                .await
                .map_err(|_| GatewayError::BindFailed("gate closed".to_string()))?;
            permit.forget();
        }
        // Clone out so no guard is held by the returned value.
        let bind_error = self.bind_error.lock().clone();
        if let Some(error) = bind_error {
            return Err(error);
        }
        Ok(ServiceBinding {
            api_version: self.api_version.load(Ordering::SeqCst),
        })
    }

    fn unbind(&self) {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
    }

    async fn is_billing_supported(
        &self,
        _api_version: u32,
        _purchase_type: PurchaseType,
    ) -> Result<ResponseCode, GatewayError> {
        let code = *self.billing_supported.lock();
        Ok(code)
    }

    async fn purchase(&self, intent: PurchaseIntentRequest) -> Result<PurchaseOutcome, GatewayError> {
        self.before_call().await?;
        self.purchase_requests.lock().push(intent);
        let (tx, rx) = oneshot::channel();
        self.open_flows.lock().push_back(tx);
        Ok(rx
            .map(|outcome| outcome.unwrap_or(Err(GatewayError::ServiceLost)))
            .boxed())
    }

    async fn consume(&self, _api_version: u32, purchase_token: &str) -> Result<ResponseCode, GatewayError> {
        self.before_call().await?;
        self.consumed.lock().push(purchase_token.to_string());
        let answer = self.consume_answers.lock().pop_front();
        answer.unwrap_or(Ok(ResponseCode::Ok))
    }

    async fn get_purchases(
        &self,
        _api_version: u32,
        _purchase_type: PurchaseType,
        continuation_token: Option<String>,
    ) -> Result<RawPurchaseList, GatewayError> {
        self.before_call().await?;
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .page_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GatewayError::Remote("transient network error".to_string()));
        }
        let index = match continuation_token.as_deref() {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| GatewayError::Remote(format!("unknown continuation token {token}")))?,
        };
        let page = self.purchase_pages.lock().get(index).cloned();
        Ok(page.unwrap_or_default())
    }

    async fn get_sku_details(
        &self,
        _api_version: u32,
        _purchase_type: PurchaseType,
        product_ids: &[String],
    ) -> Result<RawSkuDetailsList, GatewayError> {
        self.before_call().await?;
        self.sku_requests.lock().push(product_ids.to_vec());
        let details = self.sku_details.lock().clone();
        Ok(details)
    }

    async fn check_trial_subscription(&self) -> Result<RawTrialResult, GatewayError> {
        self.before_call().await?;
        let trial = self.trial.lock().clone();
        Ok(trial)
    }
}

// =============================================================================
// RECORDING CALLBACKS
// =============================================================================

/// One delivered callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ConnectionSucceeded,
    ConnectionFailed(BillingError),
    Disconnected,
    PurchaseFlowBegan,
    FailedToBeginFlow(BillingError),
    PurchaseSucceeded(PurchaseInfo),
    PurchaseCanceled,
    PurchaseFailed(BillingError),
    ConsumeSucceeded,
    ConsumeFailed(BillingError),
    QuerySucceeded(Vec<PurchaseInfo>),
    QueryFailed(BillingError),
    SkuDetailsReceived(Vec<SkuDetails>),
    SkuDetailsFailed(BillingError),
    TrialReceived(TrialSubscriptionInfo),
    TrialFailed(BillingError),
}

pub struct RecordingCallbacks {
    tx: mpsc::UnboundedSender<Event>,
}

impl RecordingCallbacks {
    pub fn new() -> (Arc<Self>, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), EventStream { rx })
    }

    fn record(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    /// Next event, or `None` if nothing arrives within two seconds.
    pub async fn next(&mut self) -> Option<Event> {
        self.next_within(Duration::from_secs(2)).await
    }

    pub async fn next_within(&mut self, wait: Duration) -> Option<Event> {
        tokio::time::timeout(wait, self.rx.recv()).await.ok().flatten()
    }

    /// Events already delivered, without waiting.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl ConnectionCallback for RecordingCallbacks {
    fn connection_succeeded(&self) {
        self.record(Event::ConnectionSucceeded);
    }

    fn connection_failed(&self, error: BillingError) {
        self.record(Event::ConnectionFailed(error));
    }

    fn disconnected(&self) {
        self.record(Event::Disconnected);
    }
}

impl PurchaseCallback for RecordingCallbacks {
    fn purchase_flow_began(&self) {
        self.record(Event::PurchaseFlowBegan);
    }

    fn failed_to_begin_flow(&self, error: BillingError) {
        self.record(Event::FailedToBeginFlow(error));
    }

    fn purchase_succeeded(&self, purchase: PurchaseInfo) {
        self.record(Event::PurchaseSucceeded(purchase));
    }

    fn purchase_canceled(&self) {
        self.record(Event::PurchaseCanceled);
    }

    fn purchase_failed(&self, error: BillingError) {
        self.record(Event::PurchaseFailed(error));
    }
}

impl ConsumeCallback for RecordingCallbacks {
    fn consume_succeeded(&self) {
        self.record(Event::ConsumeSucceeded);
    }

    fn consume_failed(&self, error: BillingError) {
        self.record(Event::ConsumeFailed(error));
    }
}

impl PurchaseQueryCallback for RecordingCallbacks {
    fn query_succeeded(&self, purchases: Vec<PurchaseInfo>) {
        self.record(Event::QuerySucceeded(purchases));
    }

    fn query_failed(&self, error: BillingError) {
        self.record(Event::QueryFailed(error));
    }
}

impl SkuDetailsCallback for RecordingCallbacks {
    fn sku_details_received(&self, details: Vec<SkuDetails>) {
        self.record(Event::SkuDetailsReceived(details));
    }

    fn sku_details_failed(&self, error: BillingError) {
        self.record(Event::SkuDetailsFailed(error));
    }
}

impl TrialSubscriptionCallback for RecordingCallbacks {
    fn trial_received(&self, info: TrialSubscriptionInfo) {
        self.record(Event::TrialReceived(info));
    }

    fn trial_failed(&self, error: BillingError) {
        self.record(Event::TrialFailed(error));
    }
}
