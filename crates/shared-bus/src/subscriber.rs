//! # Listener Side
//!
//! The listener contract and the per-listener registry entry.
//!
//! Entries never own their listener: they hold a `Weak` reference that is
//! upgraded only for the duration of one delivery. A listener dropped by its
//! owner is evicted on the next dispatch pass.

use crate::events::{ActionFilter, BroadcastEvent};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure reported by a listener. The listener is evicted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("Listener rejected event: {0}")]
    Rejected(String),
}

/// Receives broadcasts from the observer registry.
///
/// Called outside the registry lock, so implementations may register or
/// remove observers from inside `on_broadcast`.
pub trait BroadcastListener: Send + Sync {
    fn on_broadcast(&self, event: &BroadcastEvent) -> Result<(), ListenerError>;
}

/// Opaque handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverHandle(pub(crate) u64);

impl ObserverHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Read-only view of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverInfo {
    pub handle: ObserverHandle,
    pub filter_action: Option<String>,
    pub priority: i32,
    /// Whether the listener is still alive.
    pub alive: bool,
}

pub(crate) struct ObserverEntry {
    pub(crate) handle: ObserverHandle,
    pub(crate) listener: Weak<dyn BroadcastListener>,
    /// Allocation address of the listener; the identity used for idempotent
    /// registration.
    pub(crate) address: usize,
    pub(crate) filter: ActionFilter,
    pub(crate) priority: i32,
    pub(crate) last_seen: Instant,
}

impl ObserverEntry {
    pub(crate) fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.listener.strong_count() > 0
    }

    pub(crate) fn info(&self) -> ObserverInfo {
        ObserverInfo {
            handle: self.handle,
            filter_action: self.filter.filter_action().map(str::to_string),
            priority: self.priority,
            alive: self.is_alive(),
        }
    }
}

pub(crate) fn listener_address<L: ?Sized>(listener: &Arc<L>) -> usize {
    Arc::as_ptr(listener).cast::<()>() as usize
}
