//! # Outbound Request Payloads
//!
//! What the protocol layer sends to the remote billing service.

use crate::entities::{PurchaseRequest, PurchaseType};
use serde::{Deserialize, Serialize};

/// Facts learned when the channel to the service is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    /// Highest billing API version the installed service implements.
    pub api_version: u32,
}

impl ServiceBinding {
    pub fn supports(&self, required_version: u32) -> bool {
        self.api_version >= required_version
    }
}

/// Wire form of a purchase request.
///
/// Always carries a payload: it is built from a request whose payload has
/// already been generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseIntentRequest {
    pub api_version: u32,
    pub product_id: String,
    pub purchase_type: PurchaseType,
    pub payload: String,
    pub dynamic_price_token: Option<String>,
    pub flags: u32,
}

impl PurchaseIntentRequest {
    pub fn from_request(
        request: &PurchaseRequest,
        purchase_type: PurchaseType,
        api_version: u32,
    ) -> Self {
        let request = request.clone().generate_payload_if_empty();
        Self {
            api_version,
            product_id: request.product_id().to_string(),
            purchase_type,
            payload: request.payload().unwrap_or_default().to_string(),
            dynamic_price_token: request.dynamic_price_token().map(str::to_string),
            flags: request.flags(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_always_has_payload() {
        let request = PurchaseRequest::new("gold").unwrap();
        let intent = PurchaseIntentRequest::from_request(&request, PurchaseType::InApp, 3);
        assert!(!intent.payload.is_empty());
        assert_eq!(intent.product_id, "gold");
        assert_eq!(intent.purchase_type.as_str(), "inapp");
    }

    #[test]
    fn test_intent_keeps_caller_payload() {
        let request = PurchaseRequest::new("vip")
            .unwrap()
            .with_payload("corr-1")
            .with_dynamic_price_token("dp")
            .with_flags(4);
        let intent = PurchaseIntentRequest::from_request(&request, PurchaseType::Subscription, 8);
        assert_eq!(intent.payload, "corr-1");
        assert_eq!(intent.dynamic_price_token.as_deref(), Some("dp"));
        assert_eq!(intent.flags, 4);
    }

    #[test]
    fn test_binding_support() {
        let binding = ServiceBinding { api_version: 8 };
        assert!(binding.supports(3));
        assert!(binding.supports(8));
        assert!(!binding.supports(9));
    }
}
