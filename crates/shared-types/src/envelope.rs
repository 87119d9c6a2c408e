//! # Response Envelopes
//!
//! The untyped responses returned by the remote billing service.
//!
//! ## Trust Model
//!
//! - **Nothing is trusted**: envelopes are plain carriers. Only the result
//!   parser turns them into typed records, and only after the response code
//!   has been checked and, when enabled, the signature verified.
//! - **No extra fields**: an envelope holds exactly the fields the service
//!   returns. Anything else the service sends is ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer response codes of the remote billing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ResponseCode {
    Ok,
    UserCanceled,
    ServiceUnavailable,
    BillingUnavailable,
    ItemUnavailable,
    DeveloperError,
    Error,
    ItemAlreadyOwned,
    ItemNotOwned,
    /// A code this library does not know about.
    Unknown(i32),
}

impl ResponseCode {
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::UserCanceled,
            2 => Self::ServiceUnavailable,
            3 => Self::BillingUnavailable,
            4 => Self::ItemUnavailable,
            5 => Self::DeveloperError,
            6 => Self::Error,
            7 => Self::ItemAlreadyOwned,
            8 => Self::ItemNotOwned,
            other => Self::Unknown(other),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::UserCanceled => 1,
            Self::ServiceUnavailable => 2,
            Self::BillingUnavailable => 3,
            Self::ItemUnavailable => 4,
            Self::DeveloperError => 5,
            Self::Error => 6,
            Self::ItemAlreadyOwned => 7,
            Self::ItemNotOwned => 8,
            Self::Unknown(other) => *other,
        }
    }

    /// Only `Ok` counts as success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<i32> for ResponseCode {
    fn from(code: i32) -> Self {
        Self::from_i32(code)
    }
}

impl From<ResponseCode> for i32 {
    fn from(code: ResponseCode) -> Self {
        code.as_i32()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "{code} (unknown)"),
            known => write!(f, "{} ({:?})", known.as_i32(), known),
        }
    }
}

/// Response to a purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawResult {
    pub response_code: i32,
    /// Serialized purchase data, exactly as signed by the service.
    pub purchase_data: Option<String>,
    /// Base64 detached signature over `purchase_data`.
    pub data_signature: Option<String>,
}

impl RawResult {
    pub fn code(&self) -> ResponseCode {
        ResponseCode::from_i32(self.response_code)
    }

    pub fn ok(purchase_data: impl Into<String>, data_signature: impl Into<String>) -> Self {
        Self {
            response_code: ResponseCode::Ok.as_i32(),
            purchase_data: Some(purchase_data.into()),
            data_signature: Some(data_signature.into()),
        }
    }

    pub fn with_code(code: ResponseCode) -> Self {
        Self {
            response_code: code.as_i32(),
            ..Self::default()
        }
    }
}

/// One page of owned purchases.
///
/// `purchase_data_list[i]` is signed by `signature_list[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawPurchaseList {
    pub response_code: i32,
    pub purchase_data_list: Vec<String>,
    pub signature_list: Vec<String>,
    /// Present when more pages are available.
    pub continuation_token: Option<String>,
}

impl RawPurchaseList {
    pub fn code(&self) -> ResponseCode {
        ResponseCode::from_i32(self.response_code)
    }

    /// Split the page into per-item envelopes.
    ///
    /// Items whose signature is missing get `None` so the parser reports them
    /// as invalid data instead of silently dropping them.
    pub fn items(&self) -> Vec<RawResult> {
        self.purchase_data_list
            .iter()
            .enumerate()
            .map(|(index, data)| RawResult {
                response_code: self.response_code,
                purchase_data: Some(data.clone()),
                data_signature: self.signature_list.get(index).cloned(),
            })
            .collect()
    }
}

/// Response to a SKU details request. Each entry is a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawSkuDetailsList {
    pub response_code: i32,
    pub details_list: Vec<String>,
}

impl RawSkuDetailsList {
    pub fn code(&self) -> ResponseCode {
        ResponseCode::from_i32(self.response_code)
    }
}

/// Response to a trial subscription check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawTrialResult {
    pub response_code: i32,
    pub trial_data: Option<String>,
}

impl RawTrialResult {
    pub fn code(&self) -> ResponseCode {
        ResponseCode::from_i32(self.response_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code_mapping() {
        for code in 0..=8 {
            let mapped = ResponseCode::from_i32(code);
            assert!(!matches!(mapped, ResponseCode::Unknown(_)));
            assert_eq!(mapped.as_i32(), code);
        }
        assert_eq!(ResponseCode::from_i32(42), ResponseCode::Unknown(42));
        assert_eq!(ResponseCode::from_i32(-1).as_i32(), -1);
    }

    #[test]
    fn test_only_ok_is_ok() {
        assert!(ResponseCode::Ok.is_ok());
        assert!(!ResponseCode::ItemAlreadyOwned.is_ok());
        assert!(!ResponseCode::Unknown(0x7f).is_ok());
    }

    #[test]
    fn test_response_code_serde_as_integer() {
        let json = serde_json::to_string(&ResponseCode::ItemNotOwned).unwrap();
        assert_eq!(json, "8");
        let back: ResponseCode = serde_json::from_str("6").unwrap();
        assert_eq!(back, ResponseCode::Error);
    }

    #[test]
    fn test_purchase_list_items_pair_signatures() {
        let page = RawPurchaseList {
            response_code: 0,
            purchase_data_list: vec!["a".into(), "b".into()],
            signature_list: vec!["sig-a".into()],
            continuation_token: None,
        };
        let items = page.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].data_signature.as_deref(), Some("sig-a"));
        assert_eq!(items[1].data_signature, None);
    }

    #[test]
    fn test_display_includes_numeric_code() {
        assert_eq!(ResponseCode::Error.to_string(), "6 (Error)");
        assert_eq!(ResponseCode::Unknown(99).to_string(), "99 (unknown)");
    }
}
