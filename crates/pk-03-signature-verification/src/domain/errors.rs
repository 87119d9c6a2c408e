//! # Domain Errors
//!
//! Structural failures only. A well-formed signature that does not match is
//! not an error: it is a `false` verification result.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Public key is empty")]
    EmptyKey,

    #[error("Public key is not valid Base64: {0}")]
    InvalidKeyEncoding(String),

    #[error("Public key is not a valid RSA SubjectPublicKeyInfo: {0}")]
    InvalidKeyDer(String),

    #[error("Signature is not valid Base64: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Signature length {actual} does not match key modulus length {expected}")]
    SignatureLengthMismatch { expected: usize, actual: usize },
}
