//! # Result Handlers
//!
//! One trait per operation kind, one method per outcome. Every method runs
//! on the main context.

use pk_04_result_parser::PurchaseInfo;
use shared_types::{BillingError, SkuDetails, TrialSubscriptionInfo};

pub trait ConnectionCallback: Send + Sync {
    fn connection_succeeded(&self);

    fn connection_failed(&self, error: BillingError);

    /// The service went away after a successful connection. Not invoked for
    /// an explicit `disconnect()`.
    fn disconnected(&self) {}
}

/// Purchase lifecycle. `purchase_flow_began` comes first when the service
/// accepts the request; then exactly one terminal method follows.
pub trait PurchaseCallback: Send + Sync {
    fn purchase_flow_began(&self) {}

    /// The flow could not start. Terminal.
    fn failed_to_begin_flow(&self, error: BillingError);

    fn purchase_succeeded(&self, purchase: PurchaseInfo);

    /// The user backed out. Terminal.
    fn purchase_canceled(&self);

    fn purchase_failed(&self, error: BillingError);
}

pub trait ConsumeCallback: Send + Sync {
    fn consume_succeeded(&self);

    fn consume_failed(&self, error: BillingError);
}

pub trait PurchaseQueryCallback: Send + Sync {
    fn query_succeeded(&self, purchases: Vec<PurchaseInfo>);

    fn query_failed(&self, error: BillingError);
}

pub trait SkuDetailsCallback: Send + Sync {
    fn sku_details_received(&self, details: Vec<SkuDetails>);

    fn sku_details_failed(&self, error: BillingError);
}

pub trait TrialSubscriptionCallback: Send + Sync {
    fn trial_received(&self, info: TrialSubscriptionInfo);

    fn trial_failed(&self, error: BillingError);
}
