//! Registered JOSE algorithm identifiers.
//!
//! Every identifier parses strictly: a name outside the registry is an
//! [`UnsupportedAlgorithm`](JoseError::UnsupportedAlgorithm) error, never a silent fallback.

use core::fmt;
use core::str::FromStr;

use crate::JoseError;

/// Implemented by the identifier types that can appear as a header's `alg`.
pub trait Algorithm:
    Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = JoseError> + 'static
{
    /// Whether headers for this algorithm also carry `enc` and `zip`.
    const ENCRYPTED: bool;

    fn name(self) -> &'static str;
}

macro_rules! identifiers {
    ($ty:ident { $($variant:ident => $name:literal,)* }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant,)*];

            pub const fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)*
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = JoseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == s)
                    .ok_or_else(|| JoseError::UnsupportedAlgorithm(s.to_owned()))
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// Signature families, used by keys to reject algorithms from another family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureFamily {
    None,
    Hmac,
    RsaPkcs1,
    RsaPss,
    Ecdsa,
}

/// JWS `alg` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    /// Unsecured JWS. Only [`PlaintextJwt`](crate::PlaintextJwt) accepts it.
    None,
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Rs384,
    Rs512,
    Ps256,
    Ps384,
    Ps512,
    Es256,
    Es384,
    Es512,
}

identifiers!(JwsAlgorithm {
    None => "none",
    Hs256 => "HS256",
    Hs384 => "HS384",
    Hs512 => "HS512",
    Rs256 => "RS256",
    Rs384 => "RS384",
    Rs512 => "RS512",
    Ps256 => "PS256",
    Ps384 => "PS384",
    Ps512 => "PS512",
    Es256 => "ES256",
    Es384 => "ES384",
    Es512 => "ES512",
});

impl JwsAlgorithm {
    pub const fn family(self) -> SignatureFamily {
        match self {
            JwsAlgorithm::None => SignatureFamily::None,
            JwsAlgorithm::Hs256 | JwsAlgorithm::Hs384 | JwsAlgorithm::Hs512 => SignatureFamily::Hmac,
            JwsAlgorithm::Rs256 | JwsAlgorithm::Rs384 | JwsAlgorithm::Rs512 => {
                SignatureFamily::RsaPkcs1
            }
            JwsAlgorithm::Ps256 | JwsAlgorithm::Ps384 | JwsAlgorithm::Ps512 => SignatureFamily::RsaPss,
            JwsAlgorithm::Es256 | JwsAlgorithm::Es384 | JwsAlgorithm::Es512 => SignatureFamily::Ecdsa,
        }
    }

    /// The digest used by this algorithm, `None` for unsecured tokens.
    pub const fn hash(self) -> Option<HashAlgorithm> {
        match self {
            JwsAlgorithm::None => None,
            JwsAlgorithm::Hs256 | JwsAlgorithm::Rs256 | JwsAlgorithm::Ps256 | JwsAlgorithm::Es256 => {
                Some(HashAlgorithm::Sha256)
            }
            JwsAlgorithm::Hs384 | JwsAlgorithm::Rs384 | JwsAlgorithm::Ps384 | JwsAlgorithm::Es384 => {
                Some(HashAlgorithm::Sha384)
            }
            JwsAlgorithm::Hs512 | JwsAlgorithm::Rs512 | JwsAlgorithm::Ps512 | JwsAlgorithm::Es512 => {
                Some(HashAlgorithm::Sha512)
            }
        }
    }
}

impl Algorithm for JwsAlgorithm {
    const ENCRYPTED: bool = false;

    fn name(self) -> &'static str {
        JwsAlgorithm::name(self)
    }
}

/// JWE key management `alg` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JweAlgorithm {
    /// RSAES-PKCS1-v1_5
    Rsa1_5,
    /// RSAES OAEP with SHA-1 and MGF1-SHA-1
    RsaOaep,
    /// RSAES OAEP with SHA-256 and MGF1-SHA-256
    RsaOaep256,
    /// Direct use of a shared symmetric key as the CEK
    Dir,
}

identifiers!(JweAlgorithm {
    Rsa1_5 => "RSA1_5",
    RsaOaep => "RSA-OAEP",
    RsaOaep256 => "RSA-OAEP-256",
    Dir => "dir",
});

impl Algorithm for JweAlgorithm {
    const ENCRYPTED: bool = true;

    fn name(self) -> &'static str {
        JweAlgorithm::name(self)
    }
}

/// JWE content encryption `enc` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncryptionMethod {
    A128CbcHs256,
    A192CbcHs384,
    A256CbcHs512,
    A128Gcm,
    A192Gcm,
    A256Gcm,
}

identifiers!(EncryptionMethod {
    A128CbcHs256 => "A128CBC-HS256",
    A192CbcHs384 => "A192CBC-HS384",
    A256CbcHs512 => "A256CBC-HS512",
    A128Gcm => "A128GCM",
    A192Gcm => "A192GCM",
    A256Gcm => "A256GCM",
});

impl EncryptionMethod {
    /// Total content encryption key size in bits, including any MAC key.
    pub const fn key_size_bits(self) -> usize {
        match self {
            EncryptionMethod::A128CbcHs256 => 256,
            EncryptionMethod::A192CbcHs384 => 384,
            EncryptionMethod::A256CbcHs512 => 512,
            EncryptionMethod::A128Gcm => 128,
            EncryptionMethod::A192Gcm => 192,
            EncryptionMethod::A256Gcm => 256,
        }
    }

    pub const fn key_len(self) -> usize {
        self.key_size_bits() / 8
    }

    pub const fn iv_len(self) -> usize {
        if self.is_cbc_hmac() { 16 } else { 12 }
    }

    pub const fn tag_len(self) -> usize {
        match self {
            EncryptionMethod::A128CbcHs256 => 16,
            EncryptionMethod::A192CbcHs384 => 24,
            EncryptionMethod::A256CbcHs512 => 32,
            EncryptionMethod::A128Gcm | EncryptionMethod::A192Gcm | EncryptionMethod::A256Gcm => 16,
        }
    }

    pub const fn is_cbc_hmac(self) -> bool {
        matches!(
            self,
            EncryptionMethod::A128CbcHs256
                | EncryptionMethod::A192CbcHs384
                | EncryptionMethod::A256CbcHs512
        )
    }

    /// The HMAC digest of a composite AES-CBC + HMAC method.
    pub const fn mac_hash(self) -> Option<HashAlgorithm> {
        match self {
            EncryptionMethod::A128CbcHs256 => Some(HashAlgorithm::Sha256),
            EncryptionMethod::A192CbcHs384 => Some(HashAlgorithm::Sha384),
            EncryptionMethod::A256CbcHs512 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// JWE `zip` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompressionAlgorithm {
    /// Raw DEFLATE
    Deflate,
}

identifiers!(CompressionAlgorithm {
    Deflate => "DEF",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for alg in JwsAlgorithm::ALL {
            assert_eq!(alg.name().parse::<JwsAlgorithm>().unwrap(), *alg);
        }
        for alg in JweAlgorithm::ALL {
            assert_eq!(alg.to_string().parse::<JweAlgorithm>().unwrap(), *alg);
        }
        for enc in EncryptionMethod::ALL {
            assert_eq!(enc.name().parse::<EncryptionMethod>().unwrap(), *enc);
        }
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        for name in ["HS1024", "hs256", "", "RSA-OAEP-512", "A128KW"] {
            assert!(matches!(
                name.parse::<JwsAlgorithm>(),
                Err(JoseError::UnsupportedAlgorithm(_))
            ));
            assert!(name.parse::<JweAlgorithm>().is_err());
        }
        assert!("A128CBC-HS512".parse::<EncryptionMethod>().is_err());
        assert!("GZIP".parse::<CompressionAlgorithm>().is_err());
    }

    #[test]
    fn composite_sizes() {
        for enc in EncryptionMethod::ALL.iter().filter(|e| e.is_cbc_hmac()) {
            let hash = enc.mac_hash().unwrap();
            assert_eq!(enc.tag_len() * 2, hash.output_len());
            assert_eq!(enc.key_len() / 2, enc.tag_len());
            assert_eq!(enc.iv_len(), 16);
        }
    }
}
