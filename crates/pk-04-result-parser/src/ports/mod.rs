//! # Ports Layer
//!
//! - **Inbound (Driving)**: parsing API used by the billing connection

pub mod inbound;
