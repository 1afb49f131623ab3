//! # Interaction Signature Verification
//!
//! Verifies the Ed25519 signatures Discord attaches to interaction
//! webhooks. The signed message is the request timestamp concatenated with
//! the raw request body, exactly as received.
//!
//! Verification is uniform: every failure mode, from malformed hex to a
//! valid signature over different bytes, yields the same `false`. Callers
//! must not reveal which stage rejected the request.

use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading a verification key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    /// The key string is not valid hex
    #[error("Public key is not valid hex")]
    InvalidKeyEncoding,

    /// The decoded key has the wrong length
    #[error("Public key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The key bytes do not describe a valid Ed25519 point
    #[error("Public key bytes are not a valid Ed25519 key")]
    InvalidKeyMaterial,
}

/// Verifies interaction request signatures against a fixed public key
#[derive(Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Load a verifier from a hex-encoded Ed25519 public key.
    ///
    /// Discord publishes the key as 64 hex characters in the application
    /// settings. Surrounding whitespace is tolerated.
    pub fn from_hex(public_key_hex: &str) -> Result<Self, VerifierError> {
        let bytes =
            hex::decode(public_key_hex.trim()).map_err(|_| VerifierError::InvalidKeyEncoding)?;

        let key_array: [u8; PUBLIC_KEY_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| VerifierError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LENGTH,
                    actual: bytes.len(),
                })?;

        let key =
            VerifyingKey::from_bytes(&key_array).map_err(|_| VerifierError::InvalidKeyMaterial)?;

        Ok(Self { key })
    }

    /// Check a request signature.
    ///
    /// `timestamp` and `body` must be the exact header value and raw body
    /// bytes from the request. Returns `false` for any invalid input, with
    /// no distinction between malformed and forged signatures.
    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> bool {
        let signature_bytes = match hex::decode(signature_hex) {
            Ok(bytes) => bytes,
            Err(_) => {
                debug!("Signature rejected: value is not valid hex");
                return false;
            }
        };

        let signature_array: [u8; SIGNATURE_LENGTH] = match signature_bytes.as_slice().try_into() {
            Ok(array) => array,
            Err(_) => {
                debug!(
                    signature_len = signature_bytes.len(),
                    "Signature rejected: wrong length"
                );
                return false;
            }
        };

        let signature = Signature::from_bytes(&signature_array);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        match self.key.verify(&message, &signature) {
            Ok(()) => true,
            Err(_) => {
                debug!("Signature rejected: verification failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for InteractionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionVerifier")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
