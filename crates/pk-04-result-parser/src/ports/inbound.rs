//! # Inbound Ports
//!
//! The parsing API used by the billing connection.

use crate::domain::purchase::PurchaseInfo;
use shared_types::{
    BillingError, RawPurchaseList, RawResult, RawSkuDetailsList, RawTrialResult, SkuDetails,
    TrialSubscriptionInfo,
};

/// Converts raw service envelopes into typed outcomes.
pub trait ResultParserApi: Send + Sync {
    /// Parse one purchase result, verifying its signature when required.
    fn parse(&self, raw: &RawResult) -> Result<PurchaseInfo, BillingError>;

    /// Parse independent results. Fails with the first failing item in input
    /// order.
    fn parse_batch(&self, raws: &[RawResult]) -> Result<Vec<PurchaseInfo>, BillingError>;

    /// Parse one page of owned purchases.
    fn parse_purchase_list(&self, page: &RawPurchaseList) -> Result<Vec<PurchaseInfo>, BillingError>;

    fn parse_sku_details(&self, raw: &RawSkuDetailsList) -> Result<Vec<SkuDetails>, BillingError>;

    fn parse_trial(&self, raw: &RawTrialResult) -> Result<TrialSubscriptionInfo, BillingError>;
}
