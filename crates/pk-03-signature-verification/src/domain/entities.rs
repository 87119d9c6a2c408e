//! # Domain Entities
//!
//! Verification algorithms, modes and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature algorithms accepted for purchase data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-1. The primary algorithm.
    Sha1WithRsa,
    /// RSASSA-PKCS1-v1_5 with SHA-256. Tried second in fallback mode.
    Sha256WithRsa,
}

impl VerificationAlgorithm {
    /// Fixed order in which fallback mode tries the algorithms.
    pub const FALLBACK_ORDER: [Self; 2] = [Self::Sha1WithRsa, Self::Sha256WithRsa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1WithRsa => "SHA1withRSA",
            Self::Sha256WithRsa => "SHA256withRSA",
        }
    }
}

impl fmt::Display for VerificationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which algorithms a verification may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Primary algorithm only.
    #[default]
    Strict,
    /// Primary, then the secondary algorithm.
    WithFallback,
}

impl VerificationMode {
    pub fn algorithms(&self) -> &'static [VerificationAlgorithm] {
        match self {
            Self::Strict => &[VerificationAlgorithm::Sha1WithRsa],
            Self::WithFallback => &VerificationAlgorithm::FALLBACK_ORDER,
        }
    }
}

/// Outcome of one verification attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    /// Algorithm that validated the signature, when one did.
    pub algorithm: Option<String>,
    /// Structural failure description. `None` on success and on a plain
    /// signature mismatch.
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl VerificationResult {
    pub fn verified(algorithm: VerificationAlgorithm) -> Self {
        Self {
            success: true,
            algorithm: Some(algorithm.as_str().to_string()),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn mismatch() -> Self {
        Self {
            success: false,
            algorithm: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            algorithm: None,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// The signature was well-formed but did not match.
    pub fn is_mismatch(&self) -> bool {
        !self.success && self.error_message.is_none()
    }
}

/// One item of a batch verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub public_key: String,
    pub signed_data: String,
    pub signature: String,
}

impl VerificationRequest {
    pub fn new(
        public_key: impl Into<String>,
        signed_data: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            signed_data: signed_data.into(),
            signature: signature.into(),
        }
    }
}
