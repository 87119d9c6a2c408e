//! # Inbound Ports
//!
//! The verification API consumed by the result parser.

use crate::domain::entities::{VerificationMode, VerificationRequest, VerificationResult};
use crate::domain::errors::VerifyError;

/// Purchase signature verification.
///
/// Implementations must be thread-safe (`Send + Sync`) and hold no
/// per-call state: the same inputs always give the same answer.
pub trait SignatureVerificationApi: Send + Sync {
    /// Verify with the primary algorithm only.
    ///
    /// `Ok(false)` means the signature is well-formed but does not match.
    fn verify(&self, public_key: &str, signed_data: &str, signature: &str) -> Result<bool, VerifyError>;

    /// Verify with the algorithms allowed by `mode`.
    fn verify_with_mode(
        &self,
        public_key: &str,
        signed_data: &str,
        signature: &str,
        mode: VerificationMode,
    ) -> Result<VerificationResult, VerifyError>;

    /// Like [`verify_with_mode`](Self::verify_with_mode), with structural
    /// failures folded into `error_message`.
    fn verify_detailed(
        &self,
        public_key: &str,
        signed_data: &str,
        signature: &str,
        mode: VerificationMode,
    ) -> VerificationResult {
        self.verify_with_mode(public_key, signed_data, signature, mode)
            .unwrap_or_else(|e| VerificationResult::failed(e.to_string()))
    }

    /// Verify many independent requests in parallel. Output order matches
    /// input order.
    fn batch_verify(
        &self,
        requests: &[VerificationRequest],
        mode: VerificationMode,
    ) -> Vec<Result<VerificationResult, VerifyError>>;
}
