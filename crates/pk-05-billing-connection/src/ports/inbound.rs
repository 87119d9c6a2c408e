//! # Inbound Ports
//!
//! Operations the host application calls. Every call returns immediately;
//! outcomes arrive on the given callback, on the main context.

use crate::callbacks::{
    ConnectionCallback, ConsumeCallback, PurchaseCallback, PurchaseQueryCallback,
    SkuDetailsCallback, TrialSubscriptionCallback,
};
use shared_types::{ConnectionState, PurchaseRequest, PurchaseType};
use std::sync::Arc;

pub trait BillingApi: Send + Sync {
    /// Bind the remote service. Joins an outstanding attempt instead of
    /// starting a second one.
    fn connect(&self, callback: Arc<dyn ConnectionCallback>);

    /// Drop the connection. The state is `Disconnected` when this returns,
    /// and outcomes of earlier operations are discarded.
    fn disconnect(&self);

    fn state(&self) -> ConnectionState;

    fn purchase(&self, request: PurchaseRequest, purchase_type: PurchaseType, callback: Arc<dyn PurchaseCallback>);

    /// Shorthand for a subscription purchase.
    fn subscribe(&self, request: PurchaseRequest, callback: Arc<dyn PurchaseCallback>);

    fn consume(&self, purchase_token: &str, callback: Arc<dyn ConsumeCallback>);

    fn query_purchased(&self, purchase_type: PurchaseType, callback: Arc<dyn PurchaseQueryCallback>);

    fn get_sku_details(
        &self,
        purchase_type: PurchaseType,
        product_ids: Vec<String>,
        callback: Arc<dyn SkuDetailsCallback>,
    );

    fn check_trial_subscription(&self, callback: Arc<dyn TrialSubscriptionCallback>);
}
