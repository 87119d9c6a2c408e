//! # Shared Bus - Observer Registry for Billing Broadcasts
//!
//! Delivers asynchronous notifications from the remote billing service
//! (price changes, purchase state changes, pings) to every interested party.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   notify()   ┌──────────────────┐   on_broadcast()   ┌────────────┐
//! │ Billing      │ ───────────▶ │ ObserverRegistry │ ─────────────────▶ │ Listener A │
//! │ service      │              │ (priority order) │ ─────────┐         └────────────┘
//! └──────────────┘              └──────────────────┘          │         ┌────────────┐
//!                                                              └──────▶ │ Listener B │
//!                                                                       └────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Weak references**: registration never extends a listener's lifetime.
//! - **Isolation**: a failing or panicking listener is evicted; the rest of the
//!   pass still runs.
//! - **Staleness**: listeners untouched past the timeout are evicted during the
//!   next dispatch pass.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod events;
pub mod global;
pub mod registry;
pub mod subscriber;

pub use config::RegistryConfig;
pub use events::{actions, ActionFilter, BroadcastEvent};
pub use global::RegistryError;
pub use registry::{NotifyReport, ObserverRegistry};
pub use subscriber::{BroadcastListener, ListenerError, ObserverHandle, ObserverInfo};

use std::time::Duration;

/// Default staleness timeout for observers.
pub const DEFAULT_OBSERVER_TIMEOUT: Duration = Duration::from_secs(5 * 60);
