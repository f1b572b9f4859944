use jose_core::JoseError;
use jose_core::algorithm::{HashAlgorithm, JwsAlgorithm, SignatureFamily};
use jose_core::jws::{SigningKey, VerifyingKey};
use rsa::rand_core::OsRng;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use rsa::{pkcs1v15, pss};
use sha2::{Sha256, Sha384, Sha512};

use super::{RsaPublicKey, RsaSecretKey};

fn pkcs1v15_sign<D>(key: &rsa::RsaPrivateKey, input: &[u8]) -> Result<Vec<u8>, JoseError>
where
    D: sha2::Digest + sha2::digest::const_oid::AssociatedOid,
{
    pkcs1v15::SigningKey::<D>::new(key.clone())
        .try_sign(input)
        .map(|s| s.to_vec())
        .map_err(|_| JoseError::SigningFailed)
}

fn pss_sign<D>(key: &rsa::RsaPrivateKey, input: &[u8]) -> Result<Vec<u8>, JoseError>
where
    D: sha2::Digest + sha2::digest::FixedOutputReset,
{
    pss::BlindedSigningKey::<D>::new(key.clone())
        .try_sign_with_rng(&mut OsRng, input)
        .map(|s| s.to_vec())
        .map_err(|_| JoseError::SigningFailed)
}

fn pkcs1v15_verify<D>(key: &rsa::RsaPublicKey, input: &[u8], signature: &[u8]) -> bool
where
    D: sha2::Digest + sha2::digest::const_oid::AssociatedOid,
{
    let Ok(signature) = pkcs1v15::Signature::try_from(signature) else {
        return false;
    };
    pkcs1v15::VerifyingKey::<D>::new(key.clone())
        .verify(input, &signature)
        .is_ok()
}

fn pss_verify<D>(key: &rsa::RsaPublicKey, input: &[u8], signature: &[u8]) -> bool
where
    D: sha2::Digest + sha2::digest::FixedOutputReset,
{
    let Ok(signature) = pss::Signature::try_from(signature) else {
        return false;
    };
    pss::VerifyingKey::<D>::new(key.clone())
        .verify(input, &signature)
        .is_ok()
}

impl SigningKey for RsaSecretKey {
    /// `RS256`, `RS384`, `RS512` (RSASSA-PKCS1-v1_5) and `PS256`, `PS384`, `PS512`
    /// (RSASSA-PSS, salt as long as the hash).
    fn sign(&self, alg: JwsAlgorithm, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        let key = &self.0;
        match (alg.family(), alg.hash()) {
            (SignatureFamily::RsaPkcs1, Some(HashAlgorithm::Sha256)) => {
                pkcs1v15_sign::<Sha256>(key, signing_input)
            }
            (SignatureFamily::RsaPkcs1, Some(HashAlgorithm::Sha384)) => {
                pkcs1v15_sign::<Sha384>(key, signing_input)
            }
            (SignatureFamily::RsaPkcs1, Some(HashAlgorithm::Sha512)) => {
                pkcs1v15_sign::<Sha512>(key, signing_input)
            }
            (SignatureFamily::RsaPss, Some(HashAlgorithm::Sha256)) => {
                pss_sign::<Sha256>(key, signing_input)
            }
            (SignatureFamily::RsaPss, Some(HashAlgorithm::Sha384)) => {
                pss_sign::<Sha384>(key, signing_input)
            }
            (SignatureFamily::RsaPss, Some(HashAlgorithm::Sha512)) => {
                pss_sign::<Sha512>(key, signing_input)
            }
            _ => Err(JoseError::UnsupportedAlgorithm(alg.name().to_owned())),
        }
    }
}

impl VerifyingKey for RsaPublicKey {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        let key = &self.0;
        if signature.len() != self.size() {
            return false;
        }
        match (alg.family(), alg.hash()) {
            (SignatureFamily::RsaPkcs1, Some(HashAlgorithm::Sha256)) => {
                pkcs1v15_verify::<Sha256>(key, signing_input, signature)
            }
            (SignatureFamily::RsaPkcs1, Some(HashAlgorithm::Sha384)) => {
                pkcs1v15_verify::<Sha384>(key, signing_input, signature)
            }
            (SignatureFamily::RsaPkcs1, Some(HashAlgorithm::Sha512)) => {
                pkcs1v15_verify::<Sha512>(key, signing_input, signature)
            }
            (SignatureFamily::RsaPss, Some(HashAlgorithm::Sha256)) => {
                pss_verify::<Sha256>(key, signing_input, signature)
            }
            (SignatureFamily::RsaPss, Some(HashAlgorithm::Sha384)) => {
                pss_verify::<Sha384>(key, signing_input, signature)
            }
            (SignatureFamily::RsaPss, Some(HashAlgorithm::Sha512)) => {
                pss_verify::<Sha512>(key, signing_input, signature)
            }
            _ => false,
        }
    }
}

impl VerifyingKey for RsaSecretKey {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        self.public_key().verify(alg, signing_input, signature)
    }
}
