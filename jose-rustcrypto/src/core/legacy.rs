#![allow(deprecated)]

use std::ops::Deref;

use jose_core::JoseError;
use jose_core::algorithm::{EncryptionMethod, JweAlgorithm};
use jose_core::jwe::JweHandler;

use super::{AesCbcHmac, RsaKeyWrap};

/// `RSA1_5` key wrapping with an AES-CBC-HMAC content encryption method.
///
/// Every call goes straight to the [`JweHandler`] it wraps.
#[deprecated = "use `JweHandler::new(RsaKeyWrap::new(..)?, ..)` or `jose_rustcrypto::rsa_handler`"]
pub struct RsaAesCbcHmacHandler(JweHandler<RsaKeyWrap>);

impl RsaAesCbcHmacHandler {
    pub fn new(method: EncryptionMethod) -> Result<Self, JoseError> {
        if !method.is_cbc_hmac() {
            return Err(JoseError::Configuration(
                "the RSA1_5 AES-CBC-HMAC handler needs an AES-CBC-HMAC method",
            ));
        }
        let key_management = RsaKeyWrap::new(JweAlgorithm::Rsa1_5, method)?;
        let encryption = AesCbcHmac::new(method)?;
        JweHandler::new(key_management, Box::new(encryption)).map(Self)
    }

    pub fn handler(&self) -> &JweHandler<RsaKeyWrap> {
        &self.0
    }

    pub fn into_handler(self) -> JweHandler<RsaKeyWrap> {
        self.0
    }
}

impl Deref for RsaAesCbcHmacHandler {
    type Target = JweHandler<RsaKeyWrap>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
