//! # Shared Types Crate
//!
//! This crate contains the billing data model, the untyped response envelopes
//! of the remote billing service and the error taxonomy shared by every
//! subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Untrusted Envelopes**: `RawResult` and friends carry exactly the fields the
//!   remote service returns; nothing in them is trusted until the result parser
//!   has classified (and, when enabled, verified) them.
//! - **Classified Failures**: Every failure that reaches a caller is a
//!   `BillingError`, and every `BillingError` knows whether it is temporary,
//!   permanent or a user cancellation.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::*;
pub use errors::*;
pub use ipc::*;
