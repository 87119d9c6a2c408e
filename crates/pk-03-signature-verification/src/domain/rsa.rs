//! # RSA PKCS#1 v1.5 Verification
//!
//! ## Input Handling
//!
//! - Key: Base64 of a DER `SubjectPublicKeyInfo`. ASCII whitespace is
//!   stripped before decoding.
//! - Signature: Base64, whitespace stripped, and its decoded length must equal
//!   the key modulus length.
//! - Signed data: hashed exactly as given, as UTF-8 bytes. Never trimmed or
//!   re-encoded.
//!
//! Anything malformed is a `VerifyError`. A well-formed signature that does
//! not match is `false`.

use crate::domain::entities::VerificationAlgorithm;
use crate::domain::errors::VerifyError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::Sha256;

/// A decoded developer public key.
#[derive(Debug, Clone)]
pub struct DeveloperKey {
    key: RsaPublicKey,
}

impl DeveloperKey {
    /// Decode Base64 DER key material.
    pub fn from_base64(material: &str) -> Result<Self, VerifyError> {
        let compact = strip_ascii_whitespace(material);
        if compact.is_empty() {
            return Err(VerifyError::EmptyKey);
        }
        let der = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| VerifyError::InvalidKeyEncoding(e.to_string()))?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| VerifyError::InvalidKeyDer(e.to_string()))?;
        Ok(Self { key })
    }

    /// Modulus length in bytes; every valid signature has exactly this length.
    pub fn modulus_len(&self) -> usize {
        self.key.size()
    }

    /// Decode a Base64 signature for this key.
    pub fn decode_signature(&self, signature: &str) -> Result<Vec<u8>, VerifyError> {
        let compact = strip_ascii_whitespace(signature);
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| VerifyError::InvalidSignatureEncoding(e.to_string()))?;
        let expected = self.modulus_len();
        if bytes.len() != expected {
            return Err(VerifyError::SignatureLengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Check `signature` over `data` with one algorithm.
    pub fn verify(&self, algorithm: VerificationAlgorithm, data: &[u8], signature: &[u8]) -> bool {
        // A right-sized value that is still not a valid signature (for
        // example >= modulus) cannot match; that is a mismatch, not a fault.
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        match algorithm {
            VerificationAlgorithm::Sha1WithRsa => VerifyingKey::<Sha1>::new(self.key.clone())
                .verify(data, &signature)
                .is_ok(),
            VerificationAlgorithm::Sha256WithRsa => VerifyingKey::<Sha256>::new(self.key.clone())
                .verify(data, &signature)
                .is_ok(),
        }
    }
}

/// Verify with the first algorithm in `algorithms` that matches.
///
/// Returns the matching algorithm, or `None` on mismatch.
pub fn verify_any(
    public_key: &str,
    signed_data: &str,
    signature: &str,
    algorithms: &[VerificationAlgorithm],
) -> Result<Option<VerificationAlgorithm>, VerifyError> {
    let key = DeveloperKey::from_base64(public_key)?;
    let signature = key.decode_signature(signature)?;
    let data = signed_data.as_bytes();
    Ok(algorithms
        .iter()
        .copied()
        .find(|algorithm| key.verify(*algorithm, data, &signature)))
}

fn strip_ascii_whitespace(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}
