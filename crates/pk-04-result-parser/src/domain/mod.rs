//! # Domain Layer
//!
//! Decoding of purchase, catalogue and trial payloads. No verification and
//! no I/O happen here.

pub mod catalogue;
pub mod purchase;
