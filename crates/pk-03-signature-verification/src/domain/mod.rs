//! # Domain Layer
//!
//! Pure cryptographic logic with no I/O dependencies.

pub mod entities;
pub mod errors;
pub mod rsa;
