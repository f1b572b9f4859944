use std::fmt;

use jose_core::JoseError;
use rsa::BigUint;
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;

/// Smallest modulus accepted for signing or key wrapping.
pub const MIN_MODULUS_BITS: usize = 2048;

/// An RSA private key, used to sign (`RS*`, `PS*`) and to unwrap content encryption keys.
#[derive(Clone)]
pub struct RsaSecretKey(pub(crate) rsa::RsaPrivateKey);

/// An RSA public key, used to verify (`RS*`, `PS*`) and to wrap content encryption keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaPublicKey(pub(crate) rsa::RsaPublicKey);

impl fmt::Debug for RsaSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSecretKey")
            .field("bits", &self.0.n().bits())
            .finish_non_exhaustive()
    }
}

fn check_size(n: &BigUint) -> Result<(), JoseError> {
    if n.bits() < MIN_MODULUS_BITS {
        return Err(JoseError::InvalidKey);
    }
    Ok(())
}

impl RsaSecretKey {
    fn new(key: rsa::RsaPrivateKey) -> Result<Self, JoseError> {
        check_size(key.n())?;
        Ok(Self(key))
    }

    /// Generate a new key with a modulus of `bits` bits.
    pub fn random(bits: usize) -> Result<Self, JoseError> {
        if bits < MIN_MODULUS_BITS {
            return Err(JoseError::InvalidKey);
        }
        rsa::RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|_| JoseError::InvalidKey)
            .map(Self)
    }

    /// Decode a PKCS#1 `RSAPrivateKey`, DER or PEM.
    pub fn from_pkcs1(bytes: &[u8]) -> Result<Self, JoseError> {
        use rsa::pkcs1::DecodeRsaPrivateKey;

        let key = if let Ok(key) = rsa::RsaPrivateKey::from_pkcs1_der(bytes) {
            key
        } else {
            let s = str::from_utf8(bytes).map_err(|_| JoseError::InvalidKey)?;
            rsa::RsaPrivateKey::from_pkcs1_pem(s).map_err(|_| JoseError::InvalidKey)?
        };
        Self::new(key)
    }

    /// Decode a PKCS#8 `PrivateKeyInfo`, DER or PEM.
    pub fn from_pkcs8(bytes: &[u8]) -> Result<Self, JoseError> {
        use rsa::pkcs8::DecodePrivateKey;

        let key = if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_der(bytes) {
            key
        } else {
            let s = str::from_utf8(bytes).map_err(|_| JoseError::InvalidKey)?;
            rsa::RsaPrivateKey::from_pkcs8_pem(s).map_err(|_| JoseError::InvalidKey)?
        };
        Self::new(key)
    }

    /// Build a key from big-endian integers, as found in the `n`, `e`, `d`, `p` and `q`
    /// members of a JWK.
    pub fn from_components(
        n: &[u8],
        e: &[u8],
        d: &[u8],
        primes: &[&[u8]],
    ) -> Result<Self, JoseError> {
        let key = rsa::RsaPrivateKey::from_components(
            BigUint::from_bytes_be(n),
            BigUint::from_bytes_be(e),
            BigUint::from_bytes_be(d),
            primes.iter().map(|p| BigUint::from_bytes_be(p)).collect(),
        )
        .map_err(|_| JoseError::InvalidKey)?;
        key.validate().map_err(|_| JoseError::InvalidKey)?;
        Self::new(key)
    }

    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey(self.0.to_public_key())
    }

    /// Modulus size in bytes, which is also the size of signatures and wrapped keys.
    pub fn size(&self) -> usize {
        self.0.size()
    }
}

impl RsaPublicKey {
    fn new(key: rsa::RsaPublicKey) -> Result<Self, JoseError> {
        check_size(key.n())?;
        Ok(Self(key))
    }

    /// Decode a SubjectPublicKeyInfo, DER or PEM.
    pub fn from_public_key(bytes: &[u8]) -> Result<Self, JoseError> {
        use rsa::pkcs8::DecodePublicKey;

        let key = if let Ok(key) = rsa::RsaPublicKey::from_public_key_der(bytes) {
            key
        } else {
            let s = str::from_utf8(bytes).map_err(|_| JoseError::InvalidKey)?;
            rsa::RsaPublicKey::from_public_key_pem(s).map_err(|_| JoseError::InvalidKey)?
        };
        Self::new(key)
    }

    /// Decode a PKCS#1 `RSAPublicKey`, DER or PEM.
    pub fn from_pkcs1(bytes: &[u8]) -> Result<Self, JoseError> {
        use rsa::pkcs1::DecodeRsaPublicKey;

        let key = if let Ok(key) = rsa::RsaPublicKey::from_pkcs1_der(bytes) {
            key
        } else {
            let s = str::from_utf8(bytes).map_err(|_| JoseError::InvalidKey)?;
            rsa::RsaPublicKey::from_pkcs1_pem(s).map_err(|_| JoseError::InvalidKey)?
        };
        Self::new(key)
    }

    /// Build a key from the big-endian modulus and exponent.
    pub fn from_components(n: &[u8], e: &[u8]) -> Result<Self, JoseError> {
        let key = rsa::RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
            .map_err(|_| JoseError::InvalidKey)?;
        Self::new(key)
    }

    pub fn size(&self) -> usize {
        self.0.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_keys_are_rejected() {
        assert!(matches!(RsaSecretKey::random(1024), Err(JoseError::InvalidKey)));

        let small = rsa::RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let n = small.n().to_bytes_be();
        let e = small.e().to_bytes_be();
        assert!(RsaPublicKey::from_components(&n, &e).is_err());
    }

    #[test]
    fn pem_round_trip() {
        use rsa::pkcs1::EncodeRsaPrivateKey;
        use rsa::pkcs8::EncodePublicKey;
        use rsa::pkcs8::LineEnding;

        let key = RsaSecretKey::random(2048).unwrap();
        let pem = key.0.to_pkcs1_pem(LineEnding::LF).unwrap();
        let decoded = RsaSecretKey::from_pkcs1(pem.as_bytes()).unwrap();
        assert_eq!(decoded.public_key(), key.public_key());

        let der = key.public_key().0.to_public_key_der().unwrap();
        let public = RsaPublicKey::from_public_key(der.as_bytes()).unwrap();
        assert_eq!(public, key.public_key());
        assert_eq!(public.size(), 256);

        assert!(RsaPublicKey::from_public_key(b"not a key").is_err());
    }
}
