mod cbc_hmac;
#[cfg(feature = "ecdsa")]
mod curves;
#[cfg(feature = "ecdsa")]
mod ecdsa;
#[cfg(feature = "gcm")]
mod gcm;
#[cfg(feature = "rsa")]
mod legacy;
mod mac;
#[cfg(feature = "rsa")]
mod pke;
#[cfg(feature = "rsa")]
mod rsa_key;
#[cfg(feature = "rsa")]
mod rsassa;

use jose_core::JoseError;

pub use cbc_hmac::AesCbcHmac;
#[cfg(feature = "ecdsa")]
pub use curves::{CURVES, CurveParameters, EllipticCurve, P256, P384, P521};
#[cfg(feature = "ecdsa")]
pub use ecdsa::{EcPublicKey, EcSecretKey};
#[cfg(feature = "gcm")]
pub use gcm::AesGcm;
#[cfg(feature = "rsa")]
#[allow(deprecated)]
pub use legacy::RsaAesCbcHmacHandler;
pub use mac::HmacKey;
#[cfg(feature = "rsa")]
pub use pke::RsaKeyWrap;
#[cfg(feature = "rsa")]
pub use rsa_key::{MIN_MODULUS_BITS, RsaPublicKey, RsaSecretKey};

pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, JoseError> {
    let mut bytes = vec![0; len];
    getrandom::fill(&mut bytes).map_err(|_| JoseError::EncryptionFailed)?;
    Ok(bytes)
}
