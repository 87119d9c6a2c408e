//! # Billing Connection Service
//!
//! Implements `BillingApi` on top of the session, the executors, the result
//! parser and the gateway port.
//!
//! ## Operation Flow
//!
//! 1. Validate the request on the caller's thread.
//! 2. `Connected`: register a ticket and run the remote call on the
//!    background executor. `Connecting`: hold the operation until the bind
//!    settles. Otherwise fail with `Disconnected`.
//! 3. Parse and verify the raw result on the background executor.
//! 4. Claim the ticket and post the outcome to the main context. A ticket
//!    from an ended generation cannot be claimed and its outcome is dropped.
//!
//! Waiting for the user to finish a purchase flow does not occupy the
//! background executor; only the final parse does.

use crate::callbacks::{
    ConnectionCallback, ConsumeCallback, PurchaseCallback, PurchaseQueryCallback,
    SkuDetailsCallback, TrialSubscriptionCallback,
};
use crate::config::BillingConfig;
use crate::domain::errors::ConnectionSetupError;
use crate::domain::session::{ConnectStep, Session, Ticket};
use crate::ports::inbound::BillingApi;
use crate::ports::outbound::{BillingServiceGateway, GatewayError};
use billing_telemetry::log_billing_event;
use billing_telemetry::metrics::{CONNECTION_ATTEMPTS, OPERATIONS, STALE_COMPLETIONS};
use parking_lot::Mutex;
use pk_01_task_executors::{
    BackgroundExecutor, ExecutorError, MainContextExecutor, Task, TaskExecutor,
};
use pk_02_retry_policy::Backoff;
use pk_04_result_parser::{PurchaseInfo, ResultParser, ResultParserApi};
use shared_bus::{BroadcastEvent, NotifyReport, ObserverRegistry};
use shared_types::{
    AbortReason, BillingError, ConnectionState, Operation, PurchaseIntentRequest, PurchaseRequest,
    PurchaseType, RawResult, ResponseCode, ServiceBinding,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type Failure = Box<dyn FnOnce(BillingError) + Send>;
type Dispatch = Box<dyn FnOnce(Arc<Shared>, Ticket) -> Task + Send>;

/// An operation issued while the bind was still outstanding.
struct Queued {
    operation: Operation,
    fail: Failure,
    dispatch: Dispatch,
}

type BillingSession = Session<Arc<dyn ConnectionCallback>, Queued, Failure>;

struct Shared {
    config: BillingConfig,
    gateway: Arc<dyn BillingServiceGateway>,
    parser: ResultParser,
    background: Arc<dyn TaskExecutor>,
    main: Arc<MainContextExecutor>,
    registry: Mutex<Option<Arc<ObserverRegistry>>>,
    session: Mutex<BillingSession>,
}

/// Connection to the remote billing service.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct BillingConnection {
    shared: Arc<Shared>,
}

impl BillingConnection {
    /// Create a connection with its own executors on the current runtime.
    pub fn new(
        config: BillingConfig,
        gateway: Arc<dyn BillingServiceGateway>,
    ) -> Result<Self, ConnectionSetupError> {
        let background = Arc::new(BackgroundExecutor::new(config.background_mode)?);
        let main = Arc::new(MainContextExecutor::new()?);
        Ok(Self::with_executors(config, gateway, background, main))
    }

    pub fn with_executors(
        config: BillingConfig,
        gateway: Arc<dyn BillingServiceGateway>,
        background: Arc<dyn TaskExecutor>,
        main: Arc<MainContextExecutor>,
    ) -> Self {
        let parser = ResultParser::new(config.security_check.clone()).with_mode(config.verification_mode);
        Self {
            shared: Arc::new(Shared {
                config,
                gateway,
                parser,
                background,
                main,
                registry: Mutex::new(None),
                session: Mutex::new(Session::new()),
            }),
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.shared.config
    }

    /// Current connection generation. Grows on every session change.
    pub fn generation(&self) -> u64 {
        self.shared.session.lock().generation()
    }

    /// What the service reported when it was bound.
    pub fn binding(&self) -> Option<ServiceBinding> {
        self.shared.session.lock().binding()
    }

    /// Operations dispatched and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.shared.session.lock().in_flight_len()
    }

    pub fn main_context(&self) -> &Arc<MainContextExecutor> {
        &self.shared.main
    }

    /// Resolve once every outcome posted so far has been delivered.
    pub async fn flush(&self) -> Result<(), ExecutorError> {
        self.shared.main.flush().await
    }

    /// Called by the gateway adapter when the service process goes away.
    pub fn on_service_lost(&self) {
        let generation = self.generation();
        self.shared.service_lost(generation);
    }

    /// Route broadcasts to this registry instead of the process-wide one.
    pub fn set_registry(&self, registry: Arc<ObserverRegistry>) {
        *self.shared.registry.lock() = Some(registry);
    }

    /// Hand a service broadcast to the observer registry.
    ///
    /// Returns `None` when no registry is set and the global one has not been
    /// initialised.
    pub fn dispatch_broadcast(&self, event: &BroadcastEvent) -> Option<NotifyReport> {
        let local = self.shared.registry.lock().clone();
        let registry = local.or_else(|| shared_bus::global::global().ok())?;
        debug!(action = event.action(), "Dispatching billing broadcast");
        Some(registry.notify(event))
    }

    /// Disconnect and stop both executors.
    pub fn shutdown(&self) {
        self.disconnect();
        self.shared.background.shutdown();
        self.shared.main.shutdown();
    }
}

impl BillingApi for BillingConnection {
    fn connect(&self, callback: Arc<dyn ConnectionCallback>) {
        self.shared.connect(callback);
    }

    fn disconnect(&self) {
        self.shared.disconnect();
    }

    fn state(&self) -> ConnectionState {
        self.shared.session.lock().state()
    }

    fn purchase(&self, request: PurchaseRequest, purchase_type: PurchaseType, callback: Arc<dyn PurchaseCallback>) {
        self.shared.purchase(request, purchase_type, callback);
    }

    fn subscribe(&self, request: PurchaseRequest, callback: Arc<dyn PurchaseCallback>) {
        self.shared.purchase(request, PurchaseType::Subscription, callback);
    }

    fn consume(&self, purchase_token: &str, callback: Arc<dyn ConsumeCallback>) {
        self.shared.consume(purchase_token, callback);
    }

    fn query_purchased(&self, purchase_type: PurchaseType, callback: Arc<dyn PurchaseQueryCallback>) {
        self.shared.query_purchased(purchase_type, callback);
    }

    fn get_sku_details(
        &self,
        purchase_type: PurchaseType,
        product_ids: Vec<String>,
        callback: Arc<dyn SkuDetailsCallback>,
    ) {
        self.shared.get_sku_details(purchase_type, product_ids, callback);
    }

    fn check_trial_subscription(&self, callback: Arc<dyn TrialSubscriptionCallback>) {
        self.shared.check_trial_subscription(callback);
    }
}

// =============================================================================
// SESSION LIFECYCLE
// =============================================================================

impl Shared {
    fn post<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = self.main.post(callback) {
            warn!(error = %e, "Main context unavailable, dropping callback");
        }
    }

    fn record(&self, operation: Operation, outcome: &str) {
        OPERATIONS.with_label_values(&[operation.as_str(), outcome]).inc();
    }

    fn connect(self: &Arc<Self>, callback: Arc<dyn ConnectionCallback>) {
        let step = self.session.lock().connect(callback.clone());
        match step {
            ConnectStep::AlreadyConnected => {
                CONNECTION_ATTEMPTS.with_label_values(&["already_connected"]).inc();
                self.post(move || callback.connection_succeeded());
            }
            ConnectStep::Joined => {
                CONNECTION_ATTEMPTS.with_label_values(&["coalesced"]).inc();
                debug!("Connect joined the outstanding attempt");
            }
            ConnectStep::Start { generation } => {
                CONNECTION_ATTEMPTS.with_label_values(&["started"]).inc();
                info!(generation, "Connecting to billing service");
                let shared = self.clone();
                let task: Task = Box::pin(async move {
                    let result = shared.bind(generation).await;
                    shared.finish_connect(generation, result);
                });
                if let Err(e) = self.background.execute(task) {
                    warn!(error = %e, "Unable to schedule bind");
                    self.finish_connect(
                        generation,
                        Err(BillingError::aborted(Operation::Connect, AbortReason::Cancelled)),
                    );
                }
            }
        }
    }

    async fn bind(&self, generation: u64) -> Result<ServiceBinding, BillingError> {
        let binding = self
            .call(Operation::Connect, generation, self.gateway.bind())
            .await?;
        let checked = self.check_service(generation, binding).await;
        if checked.is_err() {
            self.gateway.unbind();
        }
        checked
    }

    /// Version and support checks on a freshly bound channel.
    async fn check_service(
        &self,
        generation: u64,
        binding: ServiceBinding,
    ) -> Result<ServiceBinding, BillingError> {
        if !binding.supports(self.config.min_supported_api_version) {
            warn!(
                api_version = binding.api_version,
                required = self.config.min_supported_api_version,
                "Billing service is too old"
            );
            return Err(BillingError::ServiceNotSupported);
        }
        let supported = self
            .call(
                Operation::Connect,
                generation,
                self.gateway
                    .is_billing_supported(self.config.api_version, PurchaseType::InApp),
            )
            .await?;
        if !supported.is_ok() {
            warn!(code = %supported, "Billing not supported by the service");
            return Err(BillingError::ServiceNotSupported);
        }
        Ok(binding)
    }

    fn finish_connect(self: &Arc<Self>, generation: u64, result: Result<ServiceBinding, BillingError>) {
        let bound = result.is_ok();
        let outcome = self.session.lock().finish_connect(generation, result);

        let Some(outcome) = outcome else {
            STALE_COMPLETIONS.inc();
            debug!(generation, "Discarding bind result of an abandoned attempt");
            if bound {
                self.gateway.unbind();
            }
            return;
        };

        match outcome.result {
            Ok(binding) => {
                CONNECTION_ATTEMPTS.with_label_values(&["connected"]).inc();
                info!(
                    generation,
                    api_version = binding.api_version,
                    queued = outcome.queued.len(),
                    "Connected to billing service"
                );
                for callback in outcome.callbacks {
                    self.post(move || callback.connection_succeeded());
                }
                for queued in outcome.queued {
                    self.issue(queued.operation, queued.fail, queued.dispatch);
                }
            }
            Err(error) => {
                CONNECTION_ATTEMPTS.with_label_values(&["failed"]).inc();
                warn!(generation, error = %error, "Failed to connect to billing service");
                for callback in outcome.callbacks {
                    let error = error.clone();
                    self.post(move || callback.connection_failed(error));
                }
                for queued in outcome.queued {
                    self.record(queued.operation, "rejected");
                    let fail = queued.fail;
                    self.post(move || fail(BillingError::Disconnected));
                }
            }
        }
    }

    fn disconnect(&self) {
        let teardown = self.session.lock().disconnect();
        if teardown.previous == ConnectionState::Connected {
            self.gateway.unbind();
        }
        for (ticket, _) in &teardown.in_flight {
            self.record(ticket.operation, "discarded");
        }
        log_billing_event!(
            info,
            "connection",
            "Disconnected from billing service",
            previous = %teardown.previous,
            discarded = teardown.discarded()
        );
    }

    fn service_lost(&self, generation: u64) {
        let loss = self.session.lock().service_lost(generation);
        let Some(loss) = loss else {
            return;
        };
        warn!(generation, in_flight = loss.in_flight.len(), "Billing service lost");
        self.gateway.unbind();
        for (ticket, fail) in loss.in_flight {
            self.record(ticket.operation, "failure");
            self.post(move || fail(BillingError::Disconnected));
        }
        for listener in loss.listeners {
            self.post(move || listener.disconnected());
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl Shared {
    /// Route an operation according to the current state.
    fn issue(self: &Arc<Self>, operation: Operation, fail: Failure, dispatch: Dispatch) {
        let mut session = self.session.lock();
        let state = session.state();
        match state {
            ConnectionState::Connected => {
                let ticket = session.register(operation, fail);
                drop(session);
                self.spawn(ticket, dispatch);
            }
            ConnectionState::Connecting => {
                session.enqueue(Queued {
                    operation,
                    fail,
                    dispatch,
                });
                log_billing_event!(debug, "connection", "Holding operation until connected", operation = %operation);
            }
            ConnectionState::Disconnected | ConnectionState::FailedToConnect => {
                drop(session);
                self.record(operation, "rejected");
                self.post(move || fail(BillingError::Disconnected));
            }
        }
    }

    fn spawn(self: &Arc<Self>, ticket: Ticket, dispatch: Dispatch) {
        let task = dispatch(self.clone(), ticket);
        if let Err(e) = self.background.execute(task) {
            warn!(operation = %ticket.operation, error = %e, "Unable to schedule operation");
            self.abort(&ticket, AbortReason::Cancelled);
        }
    }

    fn abort(&self, ticket: &Ticket, reason: AbortReason) {
        let fail = self.session.lock().take(ticket);
        if let Some(fail) = fail {
            self.record(ticket.operation, "failure");
            let error = BillingError::aborted(ticket.operation, reason);
            self.post(move || fail(error));
        }
    }

    fn is_live(&self, ticket: &Ticket) -> bool {
        self.session.lock().is_live(ticket)
    }

    fn binding_for(&self, ticket: &Ticket) -> Option<ServiceBinding> {
        let session = self.session.lock();
        if session.is_live(ticket) {
            session.binding()
        } else {
            None
        }
    }

    fn discard(&self, ticket: &Ticket) {
        STALE_COMPLETIONS.inc();
        self.record(ticket.operation, "stale");
        debug!(
            operation = %ticket.operation,
            generation = ticket.generation,
            "Discarding completion from an ended session"
        );
    }

    /// Claim `ticket` and post `callback`; drop it if the ticket is stale.
    fn deliver<F>(&self, ticket: &Ticket, outcome: &str, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let claimed = self.session.lock().claim(ticket);
        if !claimed {
            self.discard(ticket);
            return;
        }
        self.record(ticket.operation, outcome);
        self.post(callback);
    }

    /// Run a remote call under the operation timeout.
    async fn call<T, Fut>(&self, operation: Operation, generation: u64, call: Fut) -> Result<T, BillingError>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.config.operation_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.gateway_failure(operation, generation, e)),
            Err(_) => {
                warn!(operation = %operation, "Remote call timed out");
                Err(BillingError::aborted(operation, AbortReason::Timeout))
            }
        }
    }

    fn gateway_failure(&self, operation: Operation, generation: u64, error: GatewayError) -> BillingError {
        match error {
            GatewayError::ServiceLost => {
                self.service_lost(generation);
                BillingError::Disconnected
            }
            GatewayError::Timeout => BillingError::aborted(operation, AbortReason::Timeout),
            GatewayError::Remote(message) | GatewayError::BindFailed(message) => {
                if operation == Operation::Consume {
                    BillingError::consume_failed(&message)
                } else {
                    BillingError::Remote { message }
                }
            }
        }
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Shared {
    fn purchase(
        self: &Arc<Self>,
        request: PurchaseRequest,
        purchase_type: PurchaseType,
        callback: Arc<dyn PurchaseCallback>,
    ) {
        let operation = match purchase_type {
            PurchaseType::InApp => Operation::Purchase,
            PurchaseType::Subscription => Operation::Subscribe,
        };
        if let Err(error) = request.validate() {
            self.record(operation, "rejected");
            self.post(move || callback.failed_to_begin_flow(error));
            return;
        }
        let fail_callback = callback.clone();
        let fail: Failure = Box::new(move |e| fail_callback.failed_to_begin_flow(e));
        let dispatch: Dispatch = Box::new(move |shared, ticket| {
            Box::pin(shared.run_purchase(ticket, request, purchase_type, callback))
        });
        self.issue(operation, fail, dispatch);
    }

    async fn run_purchase(
        self: Arc<Self>,
        ticket: Ticket,
        request: PurchaseRequest,
        purchase_type: PurchaseType,
        callback: Arc<dyn PurchaseCallback>,
    ) {
        let Some(binding) = self.binding_for(&ticket) else {
            self.discard(&ticket);
            return;
        };
        if request.dynamic_price_token().is_some() && !binding.supports(self.config.dynamic_price_api_version) {
            self.deliver(&ticket, "failure", move || {
                callback.failed_to_begin_flow(BillingError::DynamicPriceNotSupported)
            });
            return;
        }

        let intent = PurchaseIntentRequest::from_request(&request, purchase_type, self.config.api_version);
        debug!(
            operation = %ticket.operation,
            product_id = %intent.product_id,
            "Starting purchase flow"
        );
        let flow = match self
            .call(ticket.operation, ticket.generation, self.gateway.purchase(intent))
            .await
        {
            Ok(flow) => flow,
            Err(error) => {
                self.deliver(&ticket, "failure", move || callback.failed_to_begin_flow(error));
                return;
            }
        };

        let fail_callback = callback.clone();
        let rearmed = self
            .session
            .lock()
            .rearm(&ticket, Box::new(move |e| fail_callback.purchase_failed(e)));
        if !rearmed {
            self.discard(&ticket);
            return;
        }
        let began = callback.clone();
        self.post(move || began.purchase_flow_began());

        // The user may take arbitrarily long; wait off the background executor.
        let shared = self.clone();
        tokio::spawn(async move {
            let raw = flow.await;
            let worker = shared.clone();
            let task: Task = Box::pin(async move { worker.finish_purchase(ticket, raw, callback) });
            if let Err(e) = shared.background.execute(task) {
                warn!(error = %e, "Unable to schedule purchase result");
                shared.abort(&ticket, AbortReason::Cancelled);
            }
        });
    }

    fn finish_purchase(
        &self,
        ticket: Ticket,
        raw: Result<RawResult, GatewayError>,
        callback: Arc<dyn PurchaseCallback>,
    ) {
        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                let error = self.gateway_failure(ticket.operation, ticket.generation, e);
                self.deliver(&ticket, "failure", move || callback.purchase_failed(error));
                return;
            }
        };
        if !self.is_live(&ticket) {
            self.discard(&ticket);
            return;
        }
        if raw.code() == ResponseCode::UserCanceled {
            self.deliver(&ticket, "canceled", move || callback.purchase_canceled());
            return;
        }
        match self.parser.parse(&raw) {
            Ok(purchase) => {
                info!(
                    operation = %ticket.operation,
                    product_id = purchase.product_id(),
                    order_id = purchase.order_id(),
                    "Purchase succeeded"
                );
                self.deliver(&ticket, "success", move || callback.purchase_succeeded(purchase));
            }
            Err(error) => {
                if error.is_security_event() {
                    error!(operation = %ticket.operation, "Rejected purchase with mismatched signature");
                }
                self.deliver(&ticket, "failure", move || callback.purchase_failed(error));
            }
        }
    }

    fn consume(self: &Arc<Self>, purchase_token: &str, callback: Arc<dyn ConsumeCallback>) {
        if purchase_token.trim().is_empty() {
            self.record(Operation::Consume, "rejected");
            self.post(move || {
                callback.consume_failed(BillingError::InvalidRequest {
                    reason: "purchase token is empty".to_string(),
                })
            });
            return;
        }
        let token = purchase_token.to_string();
        let fail_callback = callback.clone();
        let fail: Failure = Box::new(move |e| fail_callback.consume_failed(e));
        let dispatch: Dispatch = Box::new(move |shared, ticket| Box::pin(shared.run_consume(ticket, token, callback)));
        self.issue(Operation::Consume, fail, dispatch);
    }

    async fn run_consume(self: Arc<Self>, ticket: Ticket, token: String, callback: Arc<dyn ConsumeCallback>) {
        let answer = self
            .call(
                ticket.operation,
                ticket.generation,
                self.gateway.consume(self.config.api_version, &token),
            )
            .await;
        match answer {
            Ok(code) if code.is_ok() => {
                self.deliver(&ticket, "success", move || callback.consume_succeeded());
            }
            Ok(code) => {
                let error = BillingError::consume_failed_with_code(code);
                self.deliver(&ticket, "failure", move || callback.consume_failed(error));
            }
            Err(error) => {
                self.deliver(&ticket, "failure", move || callback.consume_failed(error));
            }
        }
    }

    fn query_purchased(self: &Arc<Self>, purchase_type: PurchaseType, callback: Arc<dyn PurchaseQueryCallback>) {
        let fail_callback = callback.clone();
        let fail: Failure = Box::new(move |e| fail_callback.query_failed(e));
        let dispatch: Dispatch = Box::new(move |shared, ticket| {
            Box::pin(async move {
                match shared.fetch_purchases(&ticket, purchase_type).await {
                    Ok(purchases) => {
                        shared.deliver(&ticket, "success", move || callback.query_succeeded(purchases))
                    }
                    Err(error) => shared.deliver(&ticket, "failure", move || callback.query_failed(error)),
                }
            })
        });
        self.issue(Operation::QueryPurchased, fail, dispatch);
    }

    /// Follow continuation tokens page by page. Each page fetch is retried
    /// with the query backoff, and every attempt is verified afresh.
    async fn fetch_purchases(
        &self,
        ticket: &Ticket,
        purchase_type: PurchaseType,
    ) -> Result<Vec<PurchaseInfo>, BillingError> {
        let ticket = *ticket;
        let mut backoff = Backoff::new(self.config.query_retry.clone());
        let mut purchases = Vec::new();
        let mut continuation: Option<String> = None;

        for page in 0..self.config.max_query_pages {
            let (items, next) = self
                .parser
                .parse_list_with_retry(&mut backoff, ticket.operation, |attempt| {
                    let token = continuation.clone();
                    async move {
                        if !self.is_live(&ticket) {
                            return Err(BillingError::aborted(ticket.operation, AbortReason::Cancelled));
                        }
                        if attempt > 0 {
                            debug!(page, attempt, "Refetching purchase page");
                        }
                        self.call(
                            ticket.operation,
                            ticket.generation,
                            self.gateway
                                .get_purchases(self.config.api_version, purchase_type, token),
                        )
                        .await
                    }
                })
                .await?;
            backoff.reset();
            purchases.extend(items);
            match next {
                Some(token) if !token.is_empty() => continuation = Some(token),
                _ => return Ok(purchases),
            }
        }

        warn!(
            pages = self.config.max_query_pages,
            purchases = purchases.len(),
            "Purchase query stopped at the page limit"
        );
        Ok(purchases)
    }

    fn get_sku_details(
        self: &Arc<Self>,
        purchase_type: PurchaseType,
        product_ids: Vec<String>,
        callback: Arc<dyn SkuDetailsCallback>,
    ) {
        if product_ids.is_empty() {
            self.record(Operation::GetSkuDetails, "rejected");
            self.post(move || {
                callback.sku_details_failed(BillingError::InvalidRequest {
                    reason: "no product ids given".to_string(),
                })
            });
            return;
        }
        let fail_callback = callback.clone();
        let fail: Failure = Box::new(move |e| fail_callback.sku_details_failed(e));
        let dispatch: Dispatch = Box::new(move |shared, ticket| {
            Box::pin(async move {
                let details = shared
                    .call(
                        ticket.operation,
                        ticket.generation,
                        shared
                            .gateway
                            .get_sku_details(shared.config.api_version, purchase_type, &product_ids),
                    )
                    .await
                    .and_then(|raw| shared.parser.parse_sku_details(&raw));
                match details {
                    Ok(details) => shared.deliver(&ticket, "success", move || callback.sku_details_received(details)),
                    Err(error) => shared.deliver(&ticket, "failure", move || callback.sku_details_failed(error)),
                }
            })
        });
        self.issue(Operation::GetSkuDetails, fail, dispatch);
    }

    fn check_trial_subscription(self: &Arc<Self>, callback: Arc<dyn TrialSubscriptionCallback>) {
        let fail_callback = callback.clone();
        let fail: Failure = Box::new(move |e| fail_callback.trial_failed(e));
        let dispatch: Dispatch = Box::new(move |shared, ticket| {
            Box::pin(async move {
                let Some(binding) = shared.binding_for(&ticket) else {
                    shared.discard(&ticket);
                    return;
                };
                if !binding.supports(shared.config.trial_subscription_api_version) {
                    shared.deliver(&ticket, "failure", move || {
                        callback.trial_failed(BillingError::ServiceNotSupported)
                    });
                    return;
                }
                let trial = shared
                    .call(
                        ticket.operation,
                        ticket.generation,
                        shared.gateway.check_trial_subscription(),
                    )
                    .await
                    .and_then(|raw| shared.parser.parse_trial(&raw));
                match trial {
                    Ok(info) => shared.deliver(&ticket, "success", move || callback.trial_received(info)),
                    Err(error) => shared.deliver(&ticket, "failure", move || callback.trial_failed(error)),
                }
            })
        });
        self.issue(Operation::CheckTrialSubscription, fail, dispatch);
    }
}
