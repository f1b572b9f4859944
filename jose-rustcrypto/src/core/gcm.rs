use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use jose_core::JoseError;
use jose_core::algorithm::EncryptionMethod;
use jose_core::jwe::{ContentEncryption, ContentKey, EncryptionResult};

use super::random_bytes;

type Aes192Gcm = aes_gcm::AesGcm<aes::Aes192, U12>;

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES in Galois/Counter Mode: `A128GCM`, `A192GCM` and `A256GCM`.
#[derive(Clone, Copy, Debug)]
pub struct AesGcm {
    method: EncryptionMethod,
}

impl AesGcm {
    pub fn new(method: EncryptionMethod) -> Result<Self, JoseError> {
        match method {
            EncryptionMethod::A128Gcm | EncryptionMethod::A192Gcm | EncryptionMethod::A256Gcm => {
                Ok(Self { method })
            }
            _ => Err(JoseError::UnsupportedAlgorithm(method.name().to_owned())),
        }
    }

    fn check(&self, key: &ContentKey, iv: &[u8]) -> bool {
        key.len() == self.method.key_len() && iv.len() == IV_LEN
    }
}

fn seal<C: KeyInit + Aead>(key: &[u8], iv: &[u8], msg: &[u8], aad: &[u8]) -> Option<Vec<u8>> {
    let cipher = C::new_from_slice(key).ok()?;
    cipher
        .encrypt(Nonce::<C>::from_slice(iv), Payload { msg, aad })
        .ok()
}

fn open<C: KeyInit + Aead>(key: &[u8], iv: &[u8], msg: &[u8], aad: &[u8]) -> Option<Vec<u8>> {
    let cipher = C::new_from_slice(key).ok()?;
    cipher
        .decrypt(Nonce::<C>::from_slice(iv), Payload { msg, aad })
        .ok()
}

impl ContentEncryption for AesGcm {
    fn method(&self) -> EncryptionMethod {
        self.method
    }

    fn generate_key(&self) -> Result<ContentKey, JoseError> {
        random_bytes(self.method.key_len()).map(ContentKey::from_bytes)
    }

    fn generate_iv(&self) -> Result<Vec<u8>, JoseError> {
        random_bytes(IV_LEN)
    }

    fn encrypt(
        &self,
        key: &ContentKey,
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<EncryptionResult, JoseError> {
        if !self.check(key, iv) {
            return Err(JoseError::InvalidKey);
        }
        let key = key.as_bytes();
        let mut ciphertext = match self.method {
            EncryptionMethod::A128Gcm => seal::<Aes128Gcm>(key, iv, plaintext, aad),
            EncryptionMethod::A192Gcm => seal::<Aes192Gcm>(key, iv, plaintext, aad),
            _ => seal::<Aes256Gcm>(key, iv, plaintext, aad),
        }
        .ok_or(JoseError::EncryptionFailed)?;

        let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);
        Ok(EncryptionResult::new(ciphertext, tag))
    }

    fn decrypt(
        &self,
        key: &ContentKey,
        iv: &[u8],
        encrypted: &EncryptionResult,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        if !self.check(key, iv) || encrypted.tag().len() != TAG_LEN {
            return Err(JoseError::DecryptionFailed);
        }
        let sealed = [encrypted.ciphertext(), encrypted.tag()].concat();
        let key = key.as_bytes();
        match self.method {
            EncryptionMethod::A128Gcm => open::<Aes128Gcm>(key, iv, &sealed, aad),
            EncryptionMethod::A192Gcm => open::<Aes192Gcm>(key, iv, &sealed, aad),
            _ => open::<Aes256Gcm>(key, iv, &sealed, aad),
        }
        .ok_or(JoseError::DecryptionFailed)
    }
}
