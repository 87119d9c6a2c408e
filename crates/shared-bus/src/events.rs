//! # Broadcast Events
//!
//! Asynchronous notifications originated by the remote billing service.
//!
//! An event is identified by its action string. Extras are opaque to the
//! registry and are handed to listeners untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known broadcast actions.
pub mod actions {
    /// The price of a product changed.
    pub const PRICE_CHANGED: &str = "com.farsitel.bazaar.billing.PRICE_CHANGED";
    /// A purchase changed state outside of an active purchase flow.
    pub const PURCHASE_STATE_CHANGED: &str = "com.farsitel.bazaar.billing.PURCHASE_STATE_CHANGED";
    /// Liveness probe from the billing service.
    pub const PING: &str = "com.farsitel.bazaar.ping";
}

/// A broadcast received from the billing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    action: String,
    extras: BTreeMap<String, String>,
}

impl BroadcastEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.extras
    }
}

/// Which actions a listener wants to receive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionFilter {
    action: Option<String>,
}

impl ActionFilter {
    /// Receive every action.
    pub fn all() -> Self {
        Self { action: None }
    }

    /// Receive only `action`.
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
        }
    }

    pub fn matches(&self, event: &BroadcastEvent) -> bool {
        self.action
            .as_deref()
            .map_or(true, |wanted| wanted == event.action())
    }

    pub fn filter_action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl From<Option<&str>> for ActionFilter {
    fn from(action: Option<&str>) -> Self {
        Self {
            action: action.map(str::to_string),
        }
    }
}
