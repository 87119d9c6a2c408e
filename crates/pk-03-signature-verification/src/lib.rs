//! # Signature Verification (PK-03)
//!
//! Checks that purchase data was signed by the developer's RSA key.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): key and signature decoding, RSA checks
//! - **Ports Layer** (`ports/`): the `SignatureVerificationApi` trait
//! - **Service Layer** (`service.rs`): metrics, logging, batch verification
//!
//! ## Security Notes
//!
//! - Signed data is hashed byte-for-byte. It is never trimmed.
//! - Strict mode accepts only SHA1withRSA. Fallback mode tries SHA1withRSA,
//!   then SHA256withRSA.
//! - A structural problem (bad key, bad Base64, wrong length) is an error,
//!   distinct from a signature that simply does not match.

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use domain::entities::{
    VerificationAlgorithm, VerificationMode, VerificationRequest, VerificationResult,
};
pub use domain::errors::VerifyError;
pub use domain::rsa::{verify_any, DeveloperKey};
pub use ports::inbound::SignatureVerificationApi;
pub use service::SignatureVerificationService;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
