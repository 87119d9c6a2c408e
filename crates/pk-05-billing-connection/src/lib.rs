//! # Billing Connection (PK-05)
//!
//! The connection to the remote billing service and every operation routed
//! through it: purchase, subscribe, consume, purchase queries, catalogue
//! lookups and trial checks.
//!
//! ## Threading
//!
//! Methods of `BillingApi` may be called from any thread and return at once.
//! Remote calls and parsing run on the background executor. Every outcome is
//! delivered on the main context, at most once per operation.
//!
//! ## Sessions
//!
//! Each connect/disconnect cycle is a generation. An outcome that arrives
//! after its generation ended is dropped and counted as stale.

pub mod callbacks;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use callbacks::{
    ConnectionCallback, ConsumeCallback, PurchaseCallback, PurchaseQueryCallback,
    SkuDetailsCallback, TrialSubscriptionCallback,
};
pub use config::BillingConfig;
pub use domain::errors::ConnectionSetupError;
pub use domain::session::Ticket;
pub use ports::inbound::BillingApi;
pub use ports::outbound::{BillingServiceGateway, GatewayError, PurchaseOutcome};
pub use service::BillingConnection;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
