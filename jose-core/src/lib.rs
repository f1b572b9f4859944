//! Crypto-agnostic building blocks for JSON Object Signing and Encryption.
//!
//! This crate holds the header and claims model, algorithm identifiers, the traits
//! that cryptographic backends implement, and the compact serialization of
//! JWS, JWE and nested (encrypt-then-sign or sign-then-encrypt) tokens.
//!
//! It performs no cryptography itself. Pair it with a backend such as `jose-rustcrypto`.
#![forbid(unsafe_code)]

pub mod algorithm;
pub mod claims;
pub mod encodings;
pub mod header;
pub mod jwe;
pub mod jws;
pub mod tokens;
pub mod validation;

mod compression;

pub use algorithm::{CompressionAlgorithm, EncryptionMethod, HashAlgorithm, JweAlgorithm, JwsAlgorithm};
pub use claims::ClaimsSet;
pub use header::{JweHeader, JwsHeader, Parameters};
pub use tokens::{
    EncryptedJwt, PlaintextJwt, SignedEncryptedJwt, SignedJwt, SignedThenEncryptedJwt, Token,
    UnencryptedJwt, UnsignedJwt,
};

/// Error returned for all JOSE operations that can fail
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JoseError {
    /// The algorithm or encryption method identifier is not one this library supports.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// A handler was assembled from parts that cannot work together.
    #[error("invalid configuration: {0}")]
    Configuration(&'static str),
    /// The key is malformed or the wrong size for the requested algorithm.
    #[error("could not use the provided key")]
    InvalidKey,
    /// Content or key encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,
    /// Could not decrypt or authenticate the token.
    #[error("decryption failed")]
    DecryptionFailed,
    /// Signature creation failed.
    #[error("signing failed")]
    SigningFailed,
    /// The token signature did not verify.
    #[error("token signature could not be verified")]
    VerificationFailed,
    /// A header parameter has the wrong type or an unknown value.
    #[error("invalid header parameter: {0}")]
    InvalidHeader(String),
    /// A claim has the wrong type or is not a valid StringOrURI.
    #[error("invalid claim: {0}")]
    InvalidClaim(String),
    /// Token claims failed validation.
    #[error("token claims could not be validated")]
    ClaimsError,
    /// The token was not Base64 URL encoded correctly.
    #[error("the token could not be base64 decoded")]
    Base64DecodeError,
    /// The token did not have the expected compact form.
    #[error("could not parse the token")]
    InvalidToken,
    /// The header or payload JSON could not be encoded or decoded.
    #[error("there was an error with the payload encoding: {0}")]
    Payload(#[from] serde_json::Error),
    /// The payload could not be compressed or decompressed.
    #[error("there was an error with the payload compression: {0}")]
    Compression(#[from] std::io::Error),
}
