//! # Purchase Records
//!
//! `PurchaseInfo` can only be built inside this crate, and the parser only
//! builds one after the envelope passed every check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{BillingError, PurchaseState};

/// A parsed, verified purchase. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseInfo {
    order_id: String,
    purchase_token: String,
    payload: String,
    package_name: String,
    purchase_state: PurchaseState,
    purchase_time: DateTime<Utc>,
    product_id: String,
    data_signature: String,
    original_raw_payload: String,
}

/// Purchase data exactly as the service serializes it.
#[derive(Debug, Deserialize)]
struct WirePurchase {
    #[serde(rename = "orderId", default)]
    order_id: Option<String>,
    #[serde(rename = "purchaseToken")]
    purchase_token: Option<String>,
    #[serde(rename = "developerPayload", default)]
    developer_payload: Option<String>,
    #[serde(rename = "packageName", default)]
    package_name: Option<String>,
    // Kept loose: anything but the integer sentinel means refunded.
    #[serde(rename = "purchaseState", default)]
    purchase_state: Option<Value>,
    #[serde(rename = "purchaseTime", default)]
    purchase_time: Option<Value>,
    #[serde(rename = "productId")]
    product_id: Option<String>,
}

fn required(field: Option<String>, name: &str) -> Result<String, BillingError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BillingError::InvalidData {
            reason: format!("purchase data has no {name}"),
        }),
    }
}

impl PurchaseInfo {
    /// Decode purchase data. The caller has already verified `raw_data`
    /// against `signature` (or verification is disabled).
    pub(crate) fn decode(raw_data: &str, signature: &str) -> Result<Self, BillingError> {
        let wire: WirePurchase =
            serde_json::from_str(raw_data).map_err(|e| BillingError::InvalidData {
                reason: format!("purchase data is not valid JSON: {e}"),
            })?;

        let purchase_token = required(wire.purchase_token, "purchaseToken")?;
        let product_id = required(wire.product_id, "productId")?;
        let purchase_state = PurchaseState::from_wire(wire.purchase_state.as_ref().and_then(Value::as_i64));
        let purchase_time = wire
            .purchase_time
            .as_ref()
            .and_then(Value::as_i64)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default();

        Ok(Self {
            order_id: wire.order_id.unwrap_or_default(),
            purchase_token,
            payload: wire.developer_payload.unwrap_or_default(),
            package_name: wire.package_name.unwrap_or_default(),
            purchase_state,
            purchase_time,
            product_id,
            data_signature: signature.to_string(),
            original_raw_payload: raw_data.to_string(),
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Token used to consume the purchase.
    pub fn purchase_token(&self) -> &str {
        &self.purchase_token
    }

    /// Developer payload echoed back by the service.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn purchase_state(&self) -> PurchaseState {
        self.purchase_state
    }

    pub fn is_purchased(&self) -> bool {
        self.purchase_state == PurchaseState::Purchased
    }

    pub fn purchase_time(&self) -> DateTime<Utc> {
        self.purchase_time
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn data_signature(&self) -> &str {
        &self.data_signature
    }

    /// The purchase data string exactly as received and verified.
    pub fn original_raw_payload(&self) -> &str {
        &self.original_raw_payload
    }
}
