//! JWS and JWE for [`jose_core`] (RustCrypto)
//!
//! ```
//! use jose_core::{ClaimsSet, EncryptedJwt, EncryptionMethod, JweAlgorithm, JweHeader};
//! use jose_core::{JwsAlgorithm, JwsHeader, SignedJwt, UnencryptedJwt, UnsignedJwt};
//! use jose_core::validation::{FromIssuer, HasExpiry, Time, Validate};
//! use jose_rustcrypto::core::{EcSecretKey, P256};
//! use std::time::Duration;
//!
//! // create a set of token claims
//! let mut claims = ClaimsSet::now(Duration::from_secs(3600)).unwrap();
//! claims.set_issuer("https://issuer.example/").unwrap();
//! claims.set_subject("alice").unwrap();
//!
//! // create a new keypair, then sign and serialize a token
//! let secret_key = EcSecretKey::random(&P256).unwrap();
//! let public_key = secret_key.public_key();
//! let header = JwsHeader::new(JwsAlgorithm::Es256);
//! let token = UnsignedJwt::new(header, claims.clone())
//!     .sign(&secret_key)
//!     .unwrap()
//!     .to_string();
//!
//! // parse the token, verify the signature and validate the claims
//! let jwt: SignedJwt = token.parse().unwrap();
//! let validation = Time::valid_now()
//!     .then(HasExpiry)
//!     .then(FromIssuer("https://issuer.example/"));
//! let verified = jwt.verify_and_validate(&public_key, &validation).unwrap();
//! assert_eq!(verified.subject(), Some("alice"));
//!
//! // encrypt the same claims with a shared key
//! let handler = jose_rustcrypto::direct_handler(EncryptionMethod::A256Gcm).unwrap();
//! let shared_key = handler.content_encryption().generate_key().unwrap();
//! let header = JweHeader::new(JweAlgorithm::Dir, EncryptionMethod::A256Gcm);
//! let token = UnencryptedJwt::new(header, claims)
//!     .encrypt(&handler, &shared_key)
//!     .unwrap()
//!     .to_string();
//!
//! // parse and decrypt
//! let jwe: EncryptedJwt = token.parse().unwrap();
//! let decrypted = jwe.decrypt_and_validate(&handler, &shared_key, &validation).unwrap();
//! assert_eq!(decrypted.subject(), Some("alice"));
//! ```
#![forbid(unsafe_code)]

/// Low level implementation primitives.
pub mod core;

pub use jose_core;
pub use jose_core::JoseError;

use jose_core::algorithm::EncryptionMethod;
#[cfg(feature = "rsa")]
use jose_core::algorithm::JweAlgorithm;
use jose_core::jwe::{ContentEncryption, Direct, JweHandler};
use tracing::trace;

/// The content encryption implementation for `method`.
pub fn content_encryption(
    method: EncryptionMethod,
) -> Result<Box<dyn ContentEncryption>, JoseError> {
    trace!(%method, "content encryption");
    match method {
        EncryptionMethod::A128CbcHs256
        | EncryptionMethod::A192CbcHs384
        | EncryptionMethod::A256CbcHs512 => Ok(Box::new(core::AesCbcHmac::new(method)?)),
        #[cfg(feature = "gcm")]
        EncryptionMethod::A128Gcm | EncryptionMethod::A192Gcm | EncryptionMethod::A256Gcm => {
            Ok(Box::new(core::AesGcm::new(method)?))
        }
        #[allow(unreachable_patterns)]
        _ => Err(JoseError::UnsupportedAlgorithm(method.name().to_owned())),
    }
}

/// A handler that wraps a fresh content encryption key for an RSA public key.
#[cfg(feature = "rsa")]
pub fn rsa_handler(
    alg: JweAlgorithm,
    method: EncryptionMethod,
) -> Result<JweHandler<core::RsaKeyWrap>, JoseError> {
    JweHandler::new(core::RsaKeyWrap::new(alg, method)?, content_encryption(method)?)
}

/// A handler for `dir`, where the shared symmetric key is the content encryption key.
pub fn direct_handler(method: EncryptionMethod) -> Result<JweHandler<Direct>, JoseError> {
    JweHandler::new(Direct::new(method), content_encryption(method)?)
}
