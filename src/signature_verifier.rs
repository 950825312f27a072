use crate::{PublicKey, Signature};
use ed25519_dalek::{Verifier, VerifyingKey};
use thiserror::Error;

/// Failure of the verification capability itself, as opposed to a signature that doesn't
/// verify.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum VerifierError {
    #[error("Signature verification failed: {0}")]
    Backend(String),
}

/// The capability to check that `signature` over `message` was produced by the owner of
/// `public_key`.
///
/// Implementations must be pure: the same arguments always yield the same answer.
/// `Ok(false)` means the signature is invalid, `Err` means the answer couldn't be computed.
pub trait SignatureVerifier {
    fn verify(
        &self,
        public_key: &PublicKey,
        message: &[u8],
        signature: &Signature,
    ) -> Result<bool, VerifierError>;
}

/// Verifies ed25519 signatures.
#[derive(Debug, Default, Copy, Clone)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key: &PublicKey,
        message: &[u8],
        signature: &Signature,
    ) -> Result<bool, VerifierError> {
        // Output keys are chosen by whoever creates the output. A key that isn't a curve point
        // can't have produced any signature.
        let verifying_key = match VerifyingKey::from_bytes(public_key.as_bytes()) {
            Ok(verifying_key) => verifying_key,
            Err(_) => return Ok(false),
        };
        // A signature with the wrong length can't be valid either.
        let signature = match ed25519_dalek::Signature::from_slice(signature.as_slice()) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };
        Ok(verifying_key.verify(message, &signature).is_ok())
    }
}
