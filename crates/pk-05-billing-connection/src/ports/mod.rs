//! # Ports Layer
//!
//! - **Inbound (Driving)**: `BillingApi`, the operations exposed to the host
//! - **Outbound (Driven)**: `BillingServiceGateway`, the channel to the remote
//!   billing service

pub mod inbound;
pub mod outbound;
