//! # Outbound Ports
//!
//! The message channel to the remote billing service. Adapters translate
//! these calls into whatever IPC mechanism the host platform provides.

use async_trait::async_trait;
use futures::future::BoxFuture;
use shared_types::{
    PurchaseIntentRequest, PurchaseType, RawPurchaseList, RawResult, RawSkuDetailsList,
    RawTrialResult, ResponseCode, ServiceBinding,
};
use thiserror::Error;

/// Failure of the channel itself, as opposed to a non-OK answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The service process went away.
    #[error("Billing service connection lost")]
    ServiceLost,

    /// The service is not installed or refused the bind.
    #[error("Unable to bind billing service: {0}")]
    BindFailed(String),

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Remote call timed out")]
    Timeout,
}

/// Resolves with the terminal purchase result once the user has finished
/// the flow.
pub type PurchaseOutcome = BoxFuture<'static, Result<RawResult, GatewayError>>;

#[async_trait]
pub trait BillingServiceGateway: Send + Sync {
    /// Bind the channel. Every successful bind is balanced by exactly one
    /// `unbind`; the channel stays open while any bind is outstanding.
    async fn bind(&self) -> Result<ServiceBinding, GatewayError>;

    /// Release one successful bind.
    fn unbind(&self);

    async fn is_billing_supported(
        &self,
        api_version: u32,
        purchase_type: PurchaseType,
    ) -> Result<ResponseCode, GatewayError>;

    /// Ask the service to start a purchase flow. Returns once the service
    /// accepted the request.
    async fn purchase(&self, intent: PurchaseIntentRequest) -> Result<PurchaseOutcome, GatewayError>;

    async fn consume(&self, api_version: u32, purchase_token: &str) -> Result<ResponseCode, GatewayError>;

    async fn get_purchases(
        &self,
        api_version: u32,
        purchase_type: PurchaseType,
        continuation_token: Option<String>,
    ) -> Result<RawPurchaseList, GatewayError>;

    async fn get_sku_details(
        &self,
        api_version: u32,
        purchase_type: PurchaseType,
        product_ids: &[String],
    ) -> Result<RawSkuDetailsList, GatewayError>;

    async fn check_trial_subscription(&self) -> Result<RawTrialResult, GatewayError>;
}
