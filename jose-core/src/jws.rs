//! Signature traits implemented by cryptographic backends.

use crate::JoseError;
use crate::algorithm::JwsAlgorithm;

/// A key that can produce JWS signatures.
pub trait SigningKey {
    /// Sign the JWS signing input, `BASE64URL(header) || '.' || BASE64URL(payload)`.
    ///
    /// Algorithms the key cannot serve, such as an HMAC key asked for `RS256`,
    /// are an error.
    fn sign(&self, alg: JwsAlgorithm, signing_input: &[u8]) -> Result<Vec<u8>, JoseError>;
}

/// A key that can check JWS signatures.
pub trait VerifyingKey {
    /// Whether `signature` is valid for `signing_input` under `alg`.
    ///
    /// Mismatched algorithms, malformed signatures and bad signatures are all `false`.
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool;
}

impl<K: SigningKey + ?Sized> SigningKey for &K {
    fn sign(&self, alg: JwsAlgorithm, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        K::sign(self, alg, signing_input)
    }
}

impl<K: VerifyingKey + ?Sized> VerifyingKey for &K {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        K::verify(self, alg, signing_input, signature)
    }
}
