//! # Error Types
//!
//! The caller-visible failure taxonomy shared by every subsystem.
//!
//! Each `BillingError` carries its own classification so the host application
//! can decide whether to offer a retry without matching on individual variants.

use crate::envelope::ResponseCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How a failure should be treated by callers and retry loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// May succeed if attempted again later.
    Temporary,
    /// Will fail again until something outside the library changes.
    Permanent,
    /// The user (or the caller) chose to stop.
    UserCancelled,
}

/// Caller-facing operations, used for abort reporting and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Connect,
    Purchase,
    Subscribe,
    Consume,
    QueryPurchased,
    GetSkuDetails,
    CheckTrialSubscription,
}

impl Operation {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Purchase => "purchase",
            Self::Subscribe => "subscribe",
            Self::Consume => "consume",
            Self::QueryPurchased => "query_purchased",
            Self::GetSkuDetails => "get_sku_details",
            Self::CheckTrialSubscription => "check_trial_subscription",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an operation stopped before producing an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// The user dismissed the remote purchase flow.
    UserCanceled,
    /// The remote call did not answer within the operation timeout.
    Timeout,
    /// The caller cancelled the operation.
    Cancelled,
    /// A retry loop ran out of attempts.
    RetriesExhausted,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UserCanceled => "user canceled",
            Self::Timeout => "timed out",
            Self::Cancelled => "cancelled",
            Self::RetriesExhausted => "retries exhausted",
        };
        f.write_str(label)
    }
}

// =============================================================================
// CONSUME FAILURE CLASSIFICATION
// =============================================================================

/// Why a consume request failed.
///
/// Message keywords are matched case-insensitively in table order:
///
/// | Keyword                  | Reason         | Class     |
/// |--------------------------|----------------|-----------|
/// | `network`                | `Network`      | Temporary |
/// | `timeout`, `timed out`   | `Timeout`      | Temporary |
/// | `token`                  | `InvalidToken` | Permanent |
/// | anything else            | `Unknown`      | Permanent |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumeFailureReason {
    Network,
    Timeout,
    InvalidToken,
    Unknown,
}

impl ConsumeFailureReason {
    /// Classify a free-form failure message.
    pub fn from_message(message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("network") {
            Self::Network
        } else if lowered.contains("timeout") || lowered.contains("timed out") {
            Self::Timeout
        } else if lowered.contains("token") {
            Self::InvalidToken
        } else {
            Self::Unknown
        }
    }

    /// Classify a non-OK response code from the consume call.
    pub fn from_response_code(code: ResponseCode) -> Self {
        match code {
            ResponseCode::ServiceUnavailable => Self::Network,
            ResponseCode::ItemNotOwned => Self::InvalidToken,
            _ => Self::Unknown,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Network | Self::Timeout => ErrorClass::Temporary,
            Self::InvalidToken | Self::Unknown => ErrorClass::Permanent,
        }
    }
}

impl fmt::Display for ConsumeFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::InvalidToken => "invalid token",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

// =============================================================================
// BILLING ERROR
// =============================================================================

/// Every failure delivered to a caller's failure callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// The remote billing service is not bound.
    #[error("Billing service is disconnected")]
    Disconnected,

    /// Consuming a purchase failed.
    #[error("Consume failed: {reason}")]
    ConsumeFailed { reason: ConsumeFailureReason },

    /// The purchase signature did not match the developer key.
    #[error("Purchase signature mismatch: purchase data may have been tampered with")]
    PurchaseHijacked,

    /// The remote service answered with a non-OK response code.
    #[error("Result not okay: response code {code}")]
    ResultNotOkay { code: ResponseCode },

    /// The installed billing service is too old or does not support billing.
    #[error("Billing service not supported")]
    ServiceNotSupported,

    /// The installed billing service cannot honour a dynamic price token.
    #[error("Dynamic price not supported by the billing service")]
    DynamicPriceNotSupported,

    /// The operation stopped before producing an outcome.
    #[error("{operation} aborted: {reason}")]
    Aborted {
        operation: Operation,
        reason: AbortReason,
    },

    /// The request was rejected before any remote call.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The response envelope was missing fields or could not be decoded.
    #[error("Invalid data: {reason}")]
    InvalidData { reason: String },

    /// The key or signature material was structurally invalid.
    #[error("Verification error: {reason}")]
    VerificationError { reason: String },

    /// The remote call itself failed.
    #[error("Remote call failed: {message}")]
    Remote { message: String },
}

impl BillingError {
    /// Build a consume failure from a free-form message.
    pub fn consume_failed(message: &str) -> Self {
        Self::ConsumeFailed {
            reason: ConsumeFailureReason::from_message(message),
        }
    }

    /// Build a consume failure from a non-OK response code.
    pub fn consume_failed_with_code(code: ResponseCode) -> Self {
        Self::ConsumeFailed {
            reason: ConsumeFailureReason::from_response_code(code),
        }
    }

    pub fn aborted(operation: Operation, reason: AbortReason) -> Self {
        Self::Aborted { operation, reason }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Disconnected | Self::Remote { .. } => ErrorClass::Temporary,
            Self::ConsumeFailed { reason } => reason.class(),
            Self::ResultNotOkay { code } if *code == ResponseCode::UserCanceled => {
                ErrorClass::UserCancelled
            }
            Self::Aborted { reason, .. } => match reason {
                AbortReason::Timeout => ErrorClass::Temporary,
                AbortReason::UserCanceled | AbortReason::Cancelled => ErrorClass::UserCancelled,
                AbortReason::RetriesExhausted => ErrorClass::Permanent,
            },
            Self::PurchaseHijacked
            | Self::ResultNotOkay { .. }
            | Self::ServiceNotSupported
            | Self::DynamicPriceNotSupported
            | Self::InvalidRequest { .. }
            | Self::InvalidData { .. }
            | Self::VerificationError { .. } => ErrorClass::Permanent,
        }
    }

    /// Whether an automatic retry may be attempted.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Temporary
    }

    /// Whether this failure indicates tampering rather than a failed purchase.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Self::PurchaseHijacked)
    }
}
