use jose_core::JoseError;
use jose_core::algorithm::{EncryptionMethod, JweAlgorithm};
use jose_core::jwe::{ContentEncryption, ContentKey, KeyManagement};
use rsa::rand_core::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt};
use sha1::Sha1;
use sha2::Sha256;
use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

use super::{RsaPublicKey, RsaSecretKey, random_bytes};

/// Content encryption key wrapping with RSA: `RSA1_5`, `RSA-OAEP` and `RSA-OAEP-256`.
///
/// A fresh content encryption key is generated for every token and encrypted to the
/// recipient's public key.
#[derive(Clone, Copy, Debug)]
pub struct RsaKeyWrap {
    algorithm: JweAlgorithm,
    method: EncryptionMethod,
}

impl RsaKeyWrap {
    pub fn new(algorithm: JweAlgorithm, method: EncryptionMethod) -> Result<Self, JoseError> {
        match algorithm {
            JweAlgorithm::Rsa1_5 | JweAlgorithm::RsaOaep | JweAlgorithm::RsaOaep256 => Ok(Self {
                algorithm,
                method,
            }),
            JweAlgorithm::Dir => Err(JoseError::UnsupportedAlgorithm(algorithm.name().to_owned())),
        }
    }

    /// PKCS#1 v1.5 unwrapping without a padding oracle.
    ///
    /// A random key of the expected length is prepared up front and used in place of the
    /// decrypted key whenever decryption fails or yields the wrong length. A bad encrypted
    /// key then surfaces only as a failed content decryption.
    fn unwrap_pkcs1v15(&self, key: &RsaSecretKey, encrypted_key: &[u8]) -> Result<ContentKey, JoseError> {
        let len = self.method.key_len();
        let mut cek = Zeroizing::new(random_bytes(len)?);

        let mut decrypted = Zeroizing::new(
            key.0
                .decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, encrypted_key)
                .unwrap_or_default(),
        );
        let valid = decrypted.len().ct_eq(&len);
        decrypted.resize(len, 0);

        for (c, d) in cek.iter_mut().zip(decrypted.iter()) {
            c.conditional_assign(d, valid);
        }
        Ok(ContentKey::from_bytes(cek.to_vec()))
    }
}

impl KeyManagement for RsaKeyWrap {
    type EncryptionKey = RsaPublicKey;
    type DecryptionKey = RsaSecretKey;

    fn algorithm(&self) -> JweAlgorithm {
        self.algorithm
    }

    fn method(&self) -> EncryptionMethod {
        self.method
    }

    fn content_encryption_key(
        &self,
        _: &RsaPublicKey,
        encryption: &dyn ContentEncryption,
    ) -> Result<ContentKey, JoseError> {
        let cek = encryption.generate_key()?;
        if cek.len() != self.method.key_len() {
            return Err(JoseError::Configuration(
                "content encryption generated a key of the wrong size",
            ));
        }
        Ok(cek)
    }

    fn generate_encrypted_key(&self, key: &RsaPublicKey, cek: &ContentKey) -> Result<Vec<u8>, JoseError> {
        let cek = cek.as_bytes();
        match self.algorithm {
            JweAlgorithm::Rsa1_5 => key.0.encrypt(&mut OsRng, Pkcs1v15Encrypt, cek),
            JweAlgorithm::RsaOaep => key.0.encrypt(&mut OsRng, Oaep::new::<Sha1>(), cek),
            JweAlgorithm::RsaOaep256 => key.0.encrypt(&mut OsRng, Oaep::new::<Sha256>(), cek),
            JweAlgorithm::Dir => return Err(JoseError::UnsupportedAlgorithm(self.algorithm.name().to_owned())),
        }
        .map_err(|_| JoseError::EncryptionFailed)
    }

    fn decrypt_content_encryption_key(
        &self,
        key: &RsaSecretKey,
        encrypted_key: &[u8],
    ) -> Result<ContentKey, JoseError> {
        let cek = match self.algorithm {
            JweAlgorithm::Rsa1_5 => return self.unwrap_pkcs1v15(key, encrypted_key),
            JweAlgorithm::RsaOaep => key.0.decrypt_blinded(&mut OsRng, Oaep::new::<Sha1>(), encrypted_key),
            JweAlgorithm::RsaOaep256 => {
                key.0
                    .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), encrypted_key)
            }
            JweAlgorithm::Dir => return Err(JoseError::UnsupportedAlgorithm(self.algorithm.name().to_owned())),
        }
        .map(Zeroizing::new)
        .map_err(|_| JoseError::DecryptionFailed)?;

        if cek.len() != self.method.key_len() {
            return Err(JoseError::DecryptionFailed);
        }
        Ok(ContentKey::from_bytes(cek.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AesCbcHmac;

    fn key() -> RsaSecretKey {
        RsaSecretKey::random(2048).unwrap()
    }

    #[test]
    fn wrap_unwrap() {
        let secret = key();
        let public = secret.public_key();
        let encryption = AesCbcHmac::new(EncryptionMethod::A128CbcHs256).unwrap();

        for alg in [JweAlgorithm::Rsa1_5, JweAlgorithm::RsaOaep, JweAlgorithm::RsaOaep256] {
            let wrap = RsaKeyWrap::new(alg, EncryptionMethod::A128CbcHs256).unwrap();
            let cek = wrap.content_encryption_key(&public, &encryption).unwrap();
            let encrypted = wrap.generate_encrypted_key(&public, &cek).unwrap();
            assert_eq!(encrypted.len(), 256);

            let unwrapped = wrap.decrypt_content_encryption_key(&secret, &encrypted).unwrap();
            assert_eq!(unwrapped, cek);

            let again = wrap.content_encryption_key(&public, &encryption).unwrap();
            assert_ne!(again, cek);
        }
    }

    #[test]
    fn oaep_failures_are_errors() {
        let secret = key();
        let wrap = RsaKeyWrap::new(JweAlgorithm::RsaOaep256, EncryptionMethod::A256Gcm).unwrap();
        let cek = ContentKey::from_bytes([1; 32]);
        let mut encrypted = wrap.generate_encrypted_key(&secret.public_key(), &cek).unwrap();
        encrypted[100] ^= 1;
        assert!(matches!(
            wrap.decrypt_content_encryption_key(&secret, &encrypted),
            Err(JoseError::DecryptionFailed)
        ));

        let sha1 = RsaKeyWrap::new(JweAlgorithm::RsaOaep, EncryptionMethod::A256Gcm).unwrap();
        let encrypted = sha1.generate_encrypted_key(&secret.public_key(), &cek).unwrap();
        assert!(wrap.decrypt_content_encryption_key(&secret, &encrypted).is_err());
    }

    #[test]
    fn pkcs1v15_failures_yield_a_random_key() {
        let secret = key();
        let wrap = RsaKeyWrap::new(JweAlgorithm::Rsa1_5, EncryptionMethod::A128CbcHs256).unwrap();
        let cek = ContentKey::from_bytes([1; 32]);
        let mut encrypted = wrap.generate_encrypted_key(&secret.public_key(), &cek).unwrap();
        encrypted[0] ^= 0xff;

        let first = wrap.decrypt_content_encryption_key(&secret, &encrypted).unwrap();
        let second = wrap.decrypt_content_encryption_key(&secret, &encrypted).unwrap();
        assert_eq!(first.len(), 32);
        assert_ne!(first, cek);
        assert_ne!(first, second);

        // a well formed key of the wrong length is replaced too
        let short = ContentKey::from_bytes([1; 16]);
        let encrypted = wrap.generate_encrypted_key(&secret.public_key(), &short).unwrap();
        let unwrapped = wrap.decrypt_content_encryption_key(&secret, &encrypted).unwrap();
        assert_eq!(unwrapped.len(), 32);
        assert!(!unwrapped.as_bytes().starts_with(&[1; 16]));

        assert!(wrap.decrypt_content_encryption_key(&secret, b"").is_ok());
    }

    #[test]
    fn dir_is_not_rsa() {
        assert!(RsaKeyWrap::new(JweAlgorithm::Dir, EncryptionMethod::A128Gcm).is_err());
    }
}
