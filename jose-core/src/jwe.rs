//! JWE building blocks: content encryption and key management.
//!
//! A [`JweHandler`] pairs one [`KeyManagement`] algorithm with one [`ContentEncryption`]
//! method. Cryptographic backends provide the implementations. The direct key agreement
//! mode, which needs no cryptography of its own, lives here as [`Direct`].

use core::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::JoseError;
use crate::algorithm::{EncryptionMethod, JweAlgorithm};

/// A content encryption key. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ContentKey(Vec<u8>);

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for ContentKey {}

impl ContentKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(..)")
    }
}

/// The output of content encryption. The ciphertext and tag always travel together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionResult {
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl EncryptionResult {
    pub fn new(ciphertext: Vec<u8>, tag: Vec<u8>) -> Self {
        Self { ciphertext, tag }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}

/// Authenticated encryption of the token content.
pub trait ContentEncryption: Send + Sync {
    fn method(&self) -> EncryptionMethod;

    /// A fresh random key of the size this method requires.
    fn generate_key(&self) -> Result<ContentKey, JoseError>;

    /// A fresh random initialization vector.
    fn generate_iv(&self) -> Result<Vec<u8>, JoseError>;

    fn encrypt(
        &self,
        key: &ContentKey,
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<EncryptionResult, JoseError>;

    /// Authenticate and decrypt.
    ///
    /// Every failure, whatever its cause, is reported as [`JoseError::DecryptionFailed`].
    fn decrypt(
        &self,
        key: &ContentKey,
        iv: &[u8],
        encrypted: &EncryptionResult,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError>;
}

/// How the content encryption key reaches the recipient.
pub trait KeyManagement: Send + Sync {
    /// The key the sender holds.
    type EncryptionKey: ?Sized;
    /// The key the recipient holds.
    type DecryptionKey: ?Sized;

    fn algorithm(&self) -> JweAlgorithm;

    /// The content encryption method this key management was configured for.
    fn method(&self) -> EncryptionMethod;

    /// The content encryption key for a new token.
    fn content_encryption_key(
        &self,
        key: &Self::EncryptionKey,
        encryption: &dyn ContentEncryption,
    ) -> Result<ContentKey, JoseError>;

    /// The JWE Encrypted Key segment carrying `cek` to the recipient.
    fn generate_encrypted_key(
        &self,
        key: &Self::EncryptionKey,
        cek: &ContentKey,
    ) -> Result<Vec<u8>, JoseError>;

    /// Recover the content encryption key from the JWE Encrypted Key segment.
    fn decrypt_content_encryption_key(
        &self,
        key: &Self::DecryptionKey,
        encrypted_key: &[u8],
    ) -> Result<ContentKey, JoseError>;
}

/// Direct use of a shared symmetric key as the content encryption key (`dir`).
///
/// No key is generated and the encrypted key segment is always empty.
#[derive(Clone, Copy, Debug)]
pub struct Direct {
    method: EncryptionMethod,
}

impl Direct {
    pub fn new(method: EncryptionMethod) -> Self {
        Self { method }
    }

    fn check(&self, key: &ContentKey) -> Result<(), JoseError> {
        if key.len() != self.method.key_len() {
            return Err(JoseError::InvalidKey);
        }
        Ok(())
    }
}

impl KeyManagement for Direct {
    type EncryptionKey = ContentKey;
    type DecryptionKey = ContentKey;

    fn algorithm(&self) -> JweAlgorithm {
        JweAlgorithm::Dir
    }

    fn method(&self) -> EncryptionMethod {
        self.method
    }

    fn content_encryption_key(
        &self,
        key: &ContentKey,
        _: &dyn ContentEncryption,
    ) -> Result<ContentKey, JoseError> {
        self.check(key)?;
        Ok(key.clone())
    }

    fn generate_encrypted_key(&self, _: &ContentKey, _: &ContentKey) -> Result<Vec<u8>, JoseError> {
        Ok(Vec::new())
    }

    fn decrypt_content_encryption_key(
        &self,
        key: &ContentKey,
        encrypted_key: &[u8],
    ) -> Result<ContentKey, JoseError> {
        if !encrypted_key.is_empty() {
            return Err(JoseError::DecryptionFailed);
        }
        self.check(key)?;
        Ok(key.clone())
    }
}

/// One key management algorithm paired with one content encryption method.
pub struct JweHandler<K> {
    key_management: K,
    encryption: Box<dyn ContentEncryption>,
}

impl<K: KeyManagement> JweHandler<K> {
    pub fn new(key_management: K, encryption: Box<dyn ContentEncryption>) -> Result<Self, JoseError> {
        if key_management.method() != encryption.method() {
            return Err(JoseError::Configuration(
                "key management and content encryption disagree on the encryption method",
            ));
        }
        Ok(Self {
            key_management,
            encryption,
        })
    }

    pub fn algorithm(&self) -> JweAlgorithm {
        self.key_management.algorithm()
    }

    pub fn method(&self) -> EncryptionMethod {
        self.encryption.method()
    }

    pub fn key_management(&self) -> &K {
        &self.key_management
    }

    pub fn content_encryption(&self) -> &dyn ContentEncryption {
        &*self.encryption
    }

    pub fn content_encryption_key(&self, key: &K::EncryptionKey) -> Result<ContentKey, JoseError> {
        self.key_management
            .content_encryption_key(key, &*self.encryption)
    }

    pub fn generate_encrypted_key(
        &self,
        key: &K::EncryptionKey,
        cek: &ContentKey,
    ) -> Result<Vec<u8>, JoseError> {
        self.key_management.generate_encrypted_key(key, cek)
    }

    pub fn decrypt_content_encryption_key(
        &self,
        key: &K::DecryptionKey,
        encrypted_key: &[u8],
    ) -> Result<ContentKey, JoseError> {
        self.key_management
            .decrypt_content_encryption_key(key, encrypted_key)
    }

    pub fn generate_iv(&self) -> Result<Vec<u8>, JoseError> {
        self.encryption.generate_iv()
    }

    pub fn encrypt(
        &self,
        cek: &ContentKey,
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<EncryptionResult, JoseError> {
        self.encryption.encrypt(cek, iv, plaintext, aad)
    }

    pub fn decrypt(
        &self,
        cek: &ContentKey,
        iv: &[u8],
        encrypted: &EncryptionResult,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        self.encryption.decrypt(cek, iv, encrypted, aad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reversible stand-in so the direct mode can be tested without a backend.
    struct Xor(EncryptionMethod);

    impl ContentEncryption for Xor {
        fn method(&self) -> EncryptionMethod {
            self.0
        }

        fn generate_key(&self) -> Result<ContentKey, JoseError> {
            Ok(ContentKey::from_bytes(vec![7; self.0.key_len()]))
        }

        fn generate_iv(&self) -> Result<Vec<u8>, JoseError> {
            Ok(vec![0; self.0.iv_len()])
        }

        fn encrypt(
            &self,
            key: &ContentKey,
            _: &[u8],
            plaintext: &[u8],
            _: &[u8],
        ) -> Result<EncryptionResult, JoseError> {
            let ct = plaintext.iter().map(|b| b ^ key.as_bytes()[0]).collect();
            Ok(EncryptionResult::new(ct, vec![0; self.0.tag_len()]))
        }

        fn decrypt(
            &self,
            key: &ContentKey,
            _: &[u8],
            encrypted: &EncryptionResult,
            _: &[u8],
        ) -> Result<Vec<u8>, JoseError> {
            Ok(encrypted
                .ciphertext()
                .iter()
                .map(|b| b ^ key.as_bytes()[0])
                .collect())
        }
    }

    #[test]
    fn direct_uses_the_shared_key() {
        let method = EncryptionMethod::A128CbcHs256;
        let handler = JweHandler::new(Direct::new(method), Box::new(Xor(method))).unwrap();
        let shared = ContentKey::from_bytes([3; 32]);

        let cek = handler.content_encryption_key(&shared).unwrap();
        assert_eq!(cek, shared);
        assert!(handler.generate_encrypted_key(&shared, &cek).unwrap().is_empty());
        assert_eq!(
            handler.decrypt_content_encryption_key(&shared, &[]).unwrap(),
            shared
        );
        assert!(matches!(
            handler.decrypt_content_encryption_key(&shared, &[0]),
            Err(JoseError::DecryptionFailed)
        ));
    }

    #[test]
    fn direct_checks_key_size() {
        let direct = Direct::new(EncryptionMethod::A256Gcm);
        let short = ContentKey::from_bytes([3; 16]);
        assert!(matches!(
            direct.content_encryption_key(&short, &Xor(EncryptionMethod::A256Gcm)),
            Err(JoseError::InvalidKey)
        ));
    }

    #[test]
    fn mismatched_methods_are_rejected() {
        let result = JweHandler::new(
            Direct::new(EncryptionMethod::A128Gcm),
            Box::new(Xor(EncryptionMethod::A256Gcm)),
        );
        assert!(matches!(result, Err(JoseError::Configuration(_))));
    }

    #[test]
    fn content_key_debug_is_redacted() {
        let key = ContentKey::from_bytes(b"secret".to_vec());
        assert_eq!(format!("{key:?}"), "ContentKey(..)");
    }
}
