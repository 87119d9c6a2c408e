//! # Ports Layer
//!
//! - **Inbound (Driving)**: the executor contract used by the connection
//!   state machine

pub mod inbound;
