//! # Signature Verification Service
//!
//! Implements `SignatureVerificationApi` on top of the domain layer and
//! records verification metrics.

use crate::domain::entities::{
    VerificationAlgorithm, VerificationMode, VerificationRequest, VerificationResult,
};
use crate::domain::errors::VerifyError;
use crate::domain::rsa::verify_any;
use crate::ports::inbound::SignatureVerificationApi;
use billing_telemetry::metrics::{HistogramTimer, SIGNATURE_VERIFICATIONS, VERIFICATION_DURATION};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Stateless RSA verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerificationService;

impl SignatureVerificationService {
    pub fn new() -> Self {
        Self
    }

    fn run(
        &self,
        public_key: &str,
        signed_data: &str,
        signature: &str,
        mode: VerificationMode,
    ) -> Result<Option<VerificationAlgorithm>, VerifyError> {
        let _timer = HistogramTimer::new(&VERIFICATION_DURATION);
        let outcome = verify_any(public_key, signed_data, signature, mode.algorithms());
        match &outcome {
            Ok(Some(algorithm)) => {
                SIGNATURE_VERIFICATIONS
                    .with_label_values(&[algorithm.as_str(), "valid"])
                    .inc();
                debug!(algorithm = %algorithm, "Signature verified");
            }
            Ok(None) => {
                SIGNATURE_VERIFICATIONS
                    .with_label_values(&[mode_label(mode), "invalid"])
                    .inc();
                warn!(mode = ?mode, data_len = signed_data.len(), "Signature mismatch");
            }
            Err(e) => {
                SIGNATURE_VERIFICATIONS
                    .with_label_values(&[mode_label(mode), "error"])
                    .inc();
                warn!(error = %e, "Signature verification failed");
            }
        }
        outcome
    }
}

fn mode_label(mode: VerificationMode) -> &'static str {
    match mode {
        VerificationMode::Strict => VerificationAlgorithm::Sha1WithRsa.as_str(),
        VerificationMode::WithFallback => "fallback",
    }
}

impl SignatureVerificationApi for SignatureVerificationService {
    fn verify(&self, public_key: &str, signed_data: &str, signature: &str) -> Result<bool, VerifyError> {
        self.run(public_key, signed_data, signature, VerificationMode::Strict)
            .map(|found| found.is_some())
    }

    fn verify_with_mode(
        &self,
        public_key: &str,
        signed_data: &str,
        signature: &str,
        mode: VerificationMode,
    ) -> Result<VerificationResult, VerifyError> {
        Ok(match self.run(public_key, signed_data, signature, mode)? {
            Some(algorithm) => VerificationResult::verified(algorithm),
            None => VerificationResult::mismatch(),
        })
    }

    fn batch_verify(
        &self,
        requests: &[VerificationRequest],
        mode: VerificationMode,
    ) -> Vec<Result<VerificationResult, VerifyError>> {
        requests
            .par_iter()
            .map(|r| self.verify_with_mode(&r.public_key, &r.signed_data, &r.signature, mode))
            .collect()
    }
}
