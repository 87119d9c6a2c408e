//! # Result Parser (PK-04)
//!
//! Turns a raw response from the billing service into a typed purchase
//! record or a classified failure.
//!
//! ## Trust Boundary
//!
//! With the security check enabled, a `PurchaseInfo` is never produced from
//! purchase data whose signature failed verification. A mismatch surfaces as
//! `BillingError::PurchaseHijacked`, which the retry helper never retries.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::catalogue::{decode_sku_details, decode_trial};
pub use domain::purchase::PurchaseInfo;
pub use ports::inbound::ResultParserApi;
pub use service::ResultParser;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
