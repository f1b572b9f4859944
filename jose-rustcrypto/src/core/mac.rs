use std::fmt;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use jose_core::JoseError;
use jose_core::algorithm::{HashAlgorithm, JwsAlgorithm, SignatureFamily};
use jose_core::jws::{SigningKey, VerifyingKey};
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::random_bytes;

/// A shared secret for `HS256`, `HS384` and `HS512`.
///
/// Keys shorter than the output of the hash are refused when signing or verifying.
#[derive(Clone)]
pub struct HmacKey(Zeroizing<Vec<u8>>);

impl fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HmacKey(..)")
    }
}

impl HmacKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// A random key as long as the output of `hash`.
    pub fn random(hash: HashAlgorithm) -> Result<Self, JoseError> {
        random_bytes(hash.output_len()).map(Self::from_bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn hash_for(&self, alg: JwsAlgorithm) -> Option<HashAlgorithm> {
        let hash = match (alg.family(), alg.hash()) {
            (SignatureFamily::Hmac, Some(hash)) => hash,
            _ => return None,
        };
        (self.0.len() >= hash.output_len()).then_some(hash)
    }
}

fn mac<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Option<M> {
    let mut mac = <M as KeyInit>::new_from_slice(key).ok()?;
    mac.update(input);
    Some(mac)
}

fn sign_with<M: Mac + KeyInit>(key: &[u8], input: &[u8]) -> Result<Vec<u8>, JoseError> {
    mac::<M>(key, input)
        .map(|mac| mac.finalize().into_bytes().to_vec())
        .ok_or(JoseError::SigningFailed)
}

fn verify_with<M: Mac + KeyInit>(key: &[u8], input: &[u8], signature: &[u8]) -> bool {
    mac::<M>(key, input).is_some_and(|mac| mac.verify_slice(signature).is_ok())
}

impl SigningKey for HmacKey {
    fn sign(&self, alg: JwsAlgorithm, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        match alg.family() {
            SignatureFamily::Hmac => {}
            _ => return Err(JoseError::UnsupportedAlgorithm(alg.name().to_owned())),
        }
        let key = self.as_bytes();
        match self.hash_for(alg).ok_or(JoseError::InvalidKey)? {
            HashAlgorithm::Sha256 => sign_with::<Hmac<Sha256>>(key, signing_input),
            HashAlgorithm::Sha384 => sign_with::<Hmac<Sha384>>(key, signing_input),
            HashAlgorithm::Sha512 => sign_with::<Hmac<Sha512>>(key, signing_input),
        }
    }
}

impl VerifyingKey for HmacKey {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        let key = self.as_bytes();
        match self.hash_for(alg) {
            Some(HashAlgorithm::Sha256) => {
                verify_with::<Hmac<Sha256>>(key, signing_input, signature)
            }
            Some(HashAlgorithm::Sha384) => {
                verify_with::<Hmac<Sha384>>(key, signing_input, signature)
            }
            Some(HashAlgorithm::Sha512) => {
                verify_with::<Hmac<Sha512>>(key, signing_input, signature)
            }
            None => false,
        }
    }
}
