//! # Ports Layer
//!
//! - **Inbound (Driving)**: API used by the result parser

pub mod inbound;
