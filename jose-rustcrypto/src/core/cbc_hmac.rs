use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use jose_core::JoseError;
use jose_core::algorithm::{EncryptionMethod, HashAlgorithm};
use jose_core::jwe::{ContentEncryption, ContentKey, EncryptionResult};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use super::random_bytes;

const IV_LEN: usize = 16;

/// AES in CBC mode with an HMAC-SHA-2 tag: `A128CBC-HS256`, `A192CBC-HS384` and `A256CBC-HS512`.
///
/// The content encryption key is the MAC key followed by the AES key, each half of the
/// total. The tag is the HMAC of `AAD || IV || ciphertext || AL`, where `AL` is the bit
/// length of the AAD as a big-endian `u64`, truncated to half the hash output.
#[derive(Clone, Copy, Debug)]
pub struct AesCbcHmac {
    method: EncryptionMethod,
    hash: HashAlgorithm,
    mac_key_len: usize,
    enc_key_len: usize,
}

impl AesCbcHmac {
    pub fn new(method: EncryptionMethod) -> Result<Self, JoseError> {
        let hash = method
            .mac_hash()
            .ok_or_else(|| JoseError::UnsupportedAlgorithm(method.name().to_owned()))?;

        let key_bits = method.key_size_bits();
        let mac_bits = key_bits / 2;
        let enc_bits = key_bits - mac_bits;
        if !matches!(enc_bits, 128 | 192 | 256) {
            return Err(JoseError::Configuration(
                "the AES key must be 128, 192 or 256 bits",
            ));
        }

        Ok(Self {
            method,
            hash,
            mac_key_len: mac_bits / 8,
            enc_key_len: enc_bits / 8,
        })
    }

    fn split_key<'k>(&self, key: &'k ContentKey) -> Option<(&'k [u8], &'k [u8])> {
        (key.len() == self.mac_key_len + self.enc_key_len)
            .then(|| key.as_bytes().split_at(self.mac_key_len))
    }

    fn tag(&self, mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Option<Vec<u8>> {
        let al = (aad.len() as u64 * 8).to_be_bytes();
        let parts = [aad, iv, ciphertext, &al[..]];
        let mut tag = match self.hash {
            HashAlgorithm::Sha256 => authenticate::<Hmac<Sha256>>(mac_key, parts),
            HashAlgorithm::Sha384 => authenticate::<Hmac<Sha384>>(mac_key, parts),
            HashAlgorithm::Sha512 => authenticate::<Hmac<Sha512>>(mac_key, parts),
        }?;
        tag.truncate(self.method.tag_len());
        Some(tag)
    }
}

fn authenticate<M: Mac + KeyInit>(key: &[u8], parts: [&[u8]; 4]) -> Option<Vec<u8>> {
    let mut mac = <M as KeyInit>::new_from_slice(key).ok()?;
    for part in parts {
        mac.update(part);
    }
    Some(mac.finalize().into_bytes().to_vec())
}

fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Option<Vec<u8>> {
    Some(match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .ok()?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .ok()?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .ok()?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => return None,
    })
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Option<Vec<u8>> {
    match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .ok()?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok(),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .ok()?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok(),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .ok()?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok(),
        _ => None,
    }
}

impl ContentEncryption for AesCbcHmac {
    fn method(&self) -> EncryptionMethod {
        self.method
    }

    fn generate_key(&self) -> Result<ContentKey, JoseError> {
        random_bytes(self.mac_key_len + self.enc_key_len).map(ContentKey::from_bytes)
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
        let (mac_key, enc_key) = self.split_key(key).ok_or(JoseError::InvalidKey)?;
        if iv.len() != IV_LEN {
            return Err(JoseError::EncryptionFailed);
        }

        let ciphertext = cbc_encrypt(enc_key, iv, plaintext).ok_or(JoseError::EncryptionFailed)?;
        let tag = self
            .tag(mac_key, aad, iv, &ciphertext)
            .ok_or(JoseError::EncryptionFailed)?;
        Ok(EncryptionResult::new(ciphertext, tag))
    }

    fn decrypt(
        &self,
        key: &ContentKey,
        iv: &[u8],
        encrypted: &EncryptionResult,
        aad: &[u8],
    ) -> Result<Vec<u8>, JoseError> {
        let (mac_key, enc_key) = self.split_key(key).ok_or(JoseError::DecryptionFailed)?;
        let expected = self
            .tag(mac_key, aad, iv, encrypted.ciphertext())
            .unwrap_or_default();
        let authentic = expected.ct_eq(encrypted.tag());

        // decrypt even when the tag is wrong, and only then look at either result
        let plaintext = cbc_decrypt(enc_key, iv, encrypted.ciphertext());
        match plaintext {
            Some(plaintext) if bool::from(authentic) => Ok(plaintext),
            _ => Err(JoseError::DecryptionFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    const PLAINTEXT: &[u8] = b"A cipher system must not be required to be secret, and it must be able to fall into the hands of the enemy without inconvenience";
    const AAD: &[u8] = b"The second principle of Auguste Kerckhoffs";
    const IV: [u8; 16] = hex!("1af38c2dc2b96ffdd86694092341bc04");

    fn key(len: u8) -> ContentKey {
        ContentKey::from_bytes((0..len).collect::<Vec<u8>>())
    }

    #[test]
    fn a128cbc_hs256_known_answer() {
        let aead = AesCbcHmac::new(EncryptionMethod::A128CbcHs256).unwrap();
        let result = aead.encrypt(&key(32), &IV, PLAINTEXT, AAD).unwrap();

        assert_eq!(
            result.ciphertext(),
            hex!(
                "c80edfa32ddf39d5ef00c0b468834279a2e46a1b8049f792f76bfe54b903a9c9"
                "a94ac9b47ad2655c5f10f9aef71427e2fc6f9b3f399a221489f16362c7032336"
                "09d45ac69864e3321cf82935ac4096c86e133314c54019e8ca7980dfa4b9cf1b"
                "384c486f3a54c51078158ee5d79de59fbd34d848b3d69550a67646344427ade5"
                "4b8851ffb598f7f80074b9473c82e2db"
            )
        );
        assert_eq!(result.tag(), hex!("652c3fa36b0a7c5b3219fab3a30bc1c4"));

        let plaintext = aead.decrypt(&key(32), &IV, &result, AAD).unwrap();
        assert_eq!(plaintext, PLAINTEXT);
    }

    #[test]
    fn round_trip_all_sizes() {
        for (method, key_len, tag_len) in [
            (EncryptionMethod::A128CbcHs256, 32, 16),
            (EncryptionMethod::A192CbcHs384, 48, 24),
            (EncryptionMethod::A256CbcHs512, 64, 32),
        ] {
            let aead = AesCbcHmac::new(method).unwrap();
            let key = aead.generate_key().unwrap();
            let iv = aead.generate_iv().unwrap();
            assert_eq!(key.len(), key_len);
            assert_eq!(iv.len(), 16);

            let result = aead.encrypt(&key, &iv, PLAINTEXT, AAD).unwrap();
            assert_eq!(result.tag().len(), tag_len);
            assert_eq!(result.ciphertext().len(), 144);
            assert_eq!(aead.decrypt(&key, &iv, &result, AAD).unwrap(), PLAINTEXT);

            let empty = aead.encrypt(&key, &iv, b"", b"").unwrap();
            assert_eq!(empty.ciphertext().len(), 16);
            assert!(aead.decrypt(&key, &iv, &empty, b"").unwrap().is_empty());
        }
    }

    #[test]
    fn any_bit_flip_fails() {
        let aead = AesCbcHmac::new(EncryptionMethod::A128CbcHs256).unwrap();
        let key = key(32);
        let result = aead.encrypt(&key, &IV, PLAINTEXT, AAD).unwrap();

        let mut ciphertext = result.ciphertext().to_vec();
        ciphertext[17] ^= 1;
        let flipped = EncryptionResult::new(ciphertext, result.tag().to_vec());
        assert!(matches!(
            aead.decrypt(&key, &IV, &flipped, AAD),
            Err(JoseError::DecryptionFailed)
        ));

        let mut tag = result.tag().to_vec();
        tag[0] ^= 0x80;
        let flipped = EncryptionResult::new(result.ciphertext().to_vec(), tag);
        assert!(aead.decrypt(&key, &IV, &flipped, AAD).is_err());

        let mut iv = IV;
        iv[15] ^= 1;
        assert!(aead.decrypt(&key, &iv, &result, AAD).is_err());

        let mut aad = AAD.to_vec();
        aad[0] ^= 1;
        assert!(aead.decrypt(&key, &IV, &result, &aad).is_err());
        assert!(aead.decrypt(&key, &IV, &result, &AAD[1..]).is_err());

        let truncated = EncryptionResult::new(result.ciphertext().to_vec(), result.tag()[..8].to_vec());
        assert!(aead.decrypt(&key, &IV, &truncated, AAD).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let aead = AesCbcHmac::new(EncryptionMethod::A192CbcHs384).unwrap();
        let result = aead.encrypt(&key(48), &IV, PLAINTEXT, AAD).unwrap();
        let other = aead.generate_key().unwrap();
        assert!(aead.decrypt(&other, &IV, &result, AAD).is_err());
        assert!(aead.decrypt(&key(32), &IV, &result, AAD).is_err());
        assert!(matches!(
            aead.encrypt(&key(32), &IV, PLAINTEXT, AAD),
            Err(JoseError::InvalidKey)
        ));
    }

    #[test]
    fn gcm_is_not_a_composite() {
        assert!(matches!(
            AesCbcHmac::new(EncryptionMethod::A128Gcm),
            Err(JoseError::UnsupportedAlgorithm(_))
        ));
    }
}
