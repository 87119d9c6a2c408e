//! # Poolakey Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmarks per subsystem
//! │   ├── pk_03_signature.rs
//! │   └── pk_04_result_parser.rs
//! │
//! └── integration/      # Cross-crate scenarios against the scripted service
//!     ├── purchase_scenarios.rs
//!     ├── connection_lifecycle.rs
//!     └── broadcasts.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pk-tests
//!
//! # By category
//! cargo test -p pk-tests integration::purchase_scenarios::
//! cargo test -p pk-tests integration::connection_lifecycle::
//!
//! # Benchmarks
//! cargo bench -p pk-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
