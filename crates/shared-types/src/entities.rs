//! # Core Domain Entities
//!
//! The billing data model shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Connection**: `ConnectionState`, `SecurityCheck`
//! - **Requests**: `PurchaseRequest`, `PurchaseType`
//! - **Catalogue**: `SkuDetails`, `TrialSubscriptionInfo`
//!
//! Verified purchase records (`PurchaseInfo`) are deliberately NOT defined
//! here: only the result parser may construct them.

use crate::errors::BillingError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: CONNECTION
// =============================================================================

/// Lifecycle state of the channel to the remote billing service.
///
/// Owned exclusively by the connection state machine. Everything else only
/// ever sees a copied snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    /// No channel, no attempt in flight.
    #[default]
    Disconnected,
    /// A bind attempt is outstanding.
    Connecting,
    /// The service is bound and supports the configured API version.
    Connected,
    /// The last bind attempt failed. A new `connect()` starts a fresh cycle.
    FailedToConnect,
}

impl ConnectionState {
    /// Whether operations can be dispatched right now.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::FailedToConnect => "failed-to-connect",
        };
        f.write_str(label)
    }
}

/// Whether purchase signatures are verified, and against which key.
///
/// Supplied once at configuration time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SecurityCheck {
    /// Verify every purchase against the developer's Base64 DER public key.
    Enabled {
        /// Base64 encoded `SubjectPublicKeyInfo` of the developer RSA key.
        public_key: String,
    },
    /// Accept purchase data without signature verification.
    Disabled,
}

impl SecurityCheck {
    /// Shorthand for `SecurityCheck::Enabled`.
    pub fn enabled(public_key: impl Into<String>) -> Self {
        Self::Enabled {
            public_key: public_key.into(),
        }
    }

    /// The key to verify against, if checking is enabled.
    pub fn public_key(&self) -> Option<&str> {
        match self {
            Self::Enabled { public_key } => Some(public_key),
            Self::Disabled => None,
        }
    }
}

impl Default for SecurityCheck {
    fn default() -> Self {
        Self::Disabled
    }
}

// Key material stays out of logs.
impl fmt::Debug for SecurityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled { public_key } => f
                .debug_struct("Enabled")
                .field("public_key_len", &public_key.len())
                .finish(),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

// =============================================================================
// CLUSTER B: REQUESTS
// =============================================================================

/// One-time product or recurring subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    /// Consumable or permanent one-time product.
    InApp,
    /// Recurring subscription.
    Subscription,
}

impl PurchaseType {
    /// Wire name used by the remote billing service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "inapp",
            Self::Subscription => "subs",
        }
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to buy one product.
///
/// Immutable once built. `product_id` is validated at construction so an
/// invalid request can never reach the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    product_id: String,
    payload: Option<String>,
    dynamic_price_token: Option<String>,
    flags: u32,
}

impl PurchaseRequest {
    /// Create a request for `product_id`.
    ///
    /// # Errors
    /// `BillingError::InvalidRequest` if `product_id` is empty or blank.
    pub fn new(product_id: impl Into<String>) -> Result<Self, BillingError> {
        let product_id = product_id.into();
        if product_id.trim().is_empty() {
            return Err(BillingError::InvalidRequest {
                reason: "product id must not be empty".to_string(),
            });
        }
        Ok(Self {
            product_id,
            payload: None,
            dynamic_price_token: None,
            flags: 0,
        })
    }

    /// Attach a caller-chosen correlation payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attach a dynamic price token issued by the developer backend.
    #[must_use]
    pub fn with_dynamic_price_token(mut self, token: impl Into<String>) -> Self {
        self.dynamic_price_token = Some(token.into());
        self
    }

    /// Attach an opaque UI hint forwarded untouched to the remote service.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Fill in a fresh random correlation payload when none is set.
    ///
    /// Idempotent: an already populated payload is left as is.
    #[must_use]
    pub fn generate_payload_if_empty(mut self) -> Self {
        let missing = self.payload.as_deref().map_or(true, str::is_empty);
        if missing {
            self.payload = Some(Uuid::new_v4().simple().to_string());
        }
        self
    }

    /// Re-check the request invariants.
    ///
    /// # Errors
    /// `BillingError::InvalidRequest` if the product id is blank.
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.product_id.trim().is_empty() {
            return Err(BillingError::InvalidRequest {
                reason: "product id must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Product (SKU) identifier.
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Correlation payload, if any.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Dynamic price token, if any.
    pub fn dynamic_price_token(&self) -> Option<&str> {
        self.dynamic_price_token.as_deref()
    }

    /// Opaque UI hint.
    pub fn flags(&self) -> u32 {
        self.flags
    }
}

// =============================================================================
// CLUSTER C: CATALOGUE
// =============================================================================

/// Outcome of a purchase as recorded by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseState {
    /// The purchase is active.
    Purchased,
    /// The purchase was refunded, or its state could not be determined.
    Refunded,
}

impl PurchaseState {
    /// The single wire value meaning "purchased". Everything else is refunded.
    pub const PURCHASED_SENTINEL: i64 = 0;

    /// Map the wire value pessimistically.
    pub fn from_wire(value: Option<i64>) -> Self {
        match value {
            Some(Self::PURCHASED_SENTINEL) => Self::Purchased,
            _ => Self::Refunded,
        }
    }
}

/// Catalogue entry for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuDetails {
    /// Product identifier.
    #[serde(rename = "productId")]
    pub sku: String,
    /// Wire name of the product type (`inapp` or `subs`).
    #[serde(rename = "type", default)]
    pub sku_type: String,
    /// Localised, formatted price.
    #[serde(default)]
    pub price: String,
    /// Product title.
    #[serde(default)]
    pub title: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
}

impl SkuDetails {
    /// Whether this entry describes a subscription.
    pub fn is_subscription(&self) -> bool {
        self.sku_type == PurchaseType::Subscription.as_str()
    }
}

/// Trial eligibility of the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSubscriptionInfo {
    /// Whether a trial can be started.
    #[serde(rename = "isAvailable")]
    pub is_available: bool,
    /// Length of the trial in days.
    #[serde(rename = "trialPeriodDays", default)]
    pub trial_period_days: u32,
}

impl TrialSubscriptionInfo {
    /// Whether the user may start a non-empty trial.
    pub fn can_use_trial(&self) -> bool {
        self.is_available && self.trial_period_days > 0
    }

    /// End of a trial started at `start`, or `None` when no trial is available.
    pub fn trial_end_date(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.can_use_trial() {
            return None;
        }
        start.checked_add_signed(Duration::days(i64::from(self.trial_period_days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_product_id_rejected() {
        assert!(matches!(
            PurchaseRequest::new(""),
            Err(BillingError::InvalidRequest { .. })
        ));
        assert!(PurchaseRequest::new("   ").is_err());
    }

    #[test]
    fn test_generate_payload_if_empty_fills_missing_payload() {
        let request = PurchaseRequest::new("gold").unwrap().generate_payload_if_empty();
        let payload = request.payload().unwrap();
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_generate_payload_if_empty_replaces_empty_string() {
        let request = PurchaseRequest::new("gold")
            .unwrap()
            .with_payload("")
            .generate_payload_if_empty();
        assert!(!request.payload().unwrap().is_empty());
    }

    #[test]
    fn test_generate_payload_if_empty_is_idempotent() {
        let once = PurchaseRequest::new("gold").unwrap().generate_payload_if_empty();
        let twice = once.clone().generate_payload_if_empty();
        assert_eq!(once.payload(), twice.payload());

        let explicit = PurchaseRequest::new("gold")
            .unwrap()
            .with_payload("mine")
            .generate_payload_if_empty();
        assert_eq!(explicit.payload(), Some("mine"));
    }

    #[test]
    fn test_generated_payloads_are_unique() {
        let a = PurchaseRequest::new("gold").unwrap().generate_payload_if_empty();
        let b = PurchaseRequest::new("gold").unwrap().generate_payload_if_empty();
        assert_ne!(a.payload(), b.payload());
    }

    #[test]
    fn test_purchase_state_is_pessimistic() {
        assert_eq!(PurchaseState::from_wire(Some(0)), PurchaseState::Purchased);
        assert_eq!(PurchaseState::from_wire(Some(1)), PurchaseState::Refunded);
        assert_eq!(PurchaseState::from_wire(Some(-7)), PurchaseState::Refunded);
        assert_eq!(PurchaseState::from_wire(None), PurchaseState::Refunded);
    }

    #[test]
    fn test_security_check_debug_hides_key() {
        let check = SecurityCheck::enabled("MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA");
        let rendered = format!("{:?}", check);
        assert!(!rendered.contains("MIIB"));
        assert_eq!(check.public_key().map(str::len), Some(44));
        assert_eq!(SecurityCheck::Disabled.public_key(), None);
    }

    #[test]
    fn test_security_check_serde_tagging() {
        let json = serde_json::to_string(&SecurityCheck::enabled("abc")).unwrap();
        assert!(json.contains("\"mode\":\"enabled\""));
        let back: SecurityCheck = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SecurityCheck::enabled("abc"));
    }

    #[test]
    fn test_sku_details_from_wire_json() {
        let json = r#"{"productId":"gold","type":"subs","price":"1000","title":"Gold","description":"Shiny"}"#;
        let sku: SkuDetails = serde_json::from_str(json).unwrap();
        assert_eq!(sku.sku, "gold");
        assert!(sku.is_subscription());
    }

    #[test]
    fn test_trial_end_date() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let trial = TrialSubscriptionInfo {
            is_available: true,
            trial_period_days: 7,
        };
        assert_eq!(
            trial.trial_end_date(start),
            Some(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap())
        );

        let unavailable = TrialSubscriptionInfo {
            is_available: false,
            trial_period_days: 7,
        };
        assert_eq!(unavailable.trial_end_date(start), None);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::FailedToConnect.to_string(), "failed-to-connect");
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
    }
}
