use std::fmt;

use jose_core::JoseError;
use jose_core::algorithm::{JwsAlgorithm, SignatureFamily};
use jose_core::jws::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::curves::{CurveParameters, EllipticCurve, P256, P384, P521};

/// An ECDSA private key for `ES256` (P-256), `ES384` (P-384) or `ES512` (P-521).
#[derive(Clone)]
pub enum EcSecretKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

/// An ECDSA public key for `ES256` (P-256), `ES384` (P-384) or `ES512` (P-521).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EcPublicKey {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl fmt::Debug for EcSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcSecretKey")
            .field("curve", &self.curve().name())
            .finish_non_exhaustive()
    }
}

enum Curve {
    P256,
    P384,
    P521,
}

fn curve_id(curve: &EllipticCurve) -> Result<Curve, JoseError> {
    match curve.algorithm() {
        JwsAlgorithm::Es256 => Ok(Curve::P256),
        JwsAlgorithm::Es384 => Ok(Curve::P384),
        JwsAlgorithm::Es512 => Ok(Curve::P521),
        _ => Err(JoseError::InvalidKey),
    }
}

impl EcSecretKey {
    /// Decode a big-endian scalar of exactly the curve's field length.
    pub fn from_bytes(curve: &EllipticCurve, bytes: &[u8]) -> Result<Self, JoseError> {
        if bytes.len() != curve.field_len() {
            return Err(JoseError::InvalidKey);
        }
        let key = match curve_id(curve)? {
            Curve::P256 => p256::SecretKey::from_slice(bytes).map(Self::P256),
            Curve::P384 => p384::SecretKey::from_slice(bytes).map(Self::P384),
            Curve::P521 => p521::SecretKey::from_slice(bytes).map(Self::P521),
        };
        key.map_err(|_| JoseError::InvalidKey)
    }

    pub fn random(curve: &EllipticCurve) -> Result<Self, JoseError> {
        let mut bytes = Zeroizing::new(vec![0; curve.field_len()]);
        loop {
            getrandom::fill(&mut bytes).map_err(|_| JoseError::InvalidKey)?;
            if curve.field_len() == P521.field_len() {
                // 521 bits, the top byte only has one
                bytes[0] &= 0x01;
            }
            match Self::from_bytes(curve, &bytes) {
                Err(_) => continue,
                Ok(key) => break Ok(key),
            }
        }
    }

    pub fn curve(&self) -> &'static EllipticCurve {
        match self {
            EcSecretKey::P256(_) => &P256,
            EcSecretKey::P384(_) => &P384,
            EcSecretKey::P521(_) => &P521,
        }
    }

    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(match self {
            EcSecretKey::P256(sk) => sk.to_bytes().to_vec(),
            EcSecretKey::P384(sk) => sk.to_bytes().to_vec(),
            EcSecretKey::P521(sk) => sk.to_bytes().to_vec(),
        })
    }

    pub fn public_key(&self) -> EcPublicKey {
        match self {
            EcSecretKey::P256(sk) => EcPublicKey::P256(sk.public_key()),
            EcSecretKey::P384(sk) => EcPublicKey::P384(sk.public_key()),
            EcSecretKey::P521(sk) => EcPublicKey::P521(sk.public_key()),
        }
    }
}

impl EcPublicKey {
    /// Decode a SEC1 encoded point, compressed or not.
    pub fn from_sec1_bytes(curve: &EllipticCurve, bytes: &[u8]) -> Result<Self, JoseError> {
        let key = match curve_id(curve)? {
            Curve::P256 => p256::PublicKey::from_sec1_bytes(bytes).map(Self::P256),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(bytes).map(Self::P384),
            Curve::P521 => p521::PublicKey::from_sec1_bytes(bytes).map(Self::P521),
        };
        key.map_err(|_| JoseError::InvalidKey)
    }

    /// Build a key from its affine coordinates, as found in the `x` and `y` members of a JWK.
    ///
    /// The point must be on the curve.
    pub fn from_coordinates(curve: &EllipticCurve, x: &[u8], y: &[u8]) -> Result<Self, JoseError> {
        let len = curve.field_len();
        let mut point = Vec::with_capacity(1 + 2 * len);
        point.push(0x04);
        for coordinate in [x, y] {
            let start = coordinate.iter().position(|&b| b != 0).unwrap_or(coordinate.len());
            let coordinate = &coordinate[start..];
            if coordinate.len() > len {
                return Err(JoseError::InvalidKey);
            }
            point.resize(point.len() + len - coordinate.len(), 0);
            point.extend_from_slice(coordinate);
        }
        Self::from_sec1_bytes(curve, &point)
    }

    /// Build a key for a curve given by explicit domain parameters.
    pub fn from_parameters(
        parameters: &CurveParameters<'_>,
        x: &[u8],
        y: &[u8],
    ) -> Result<Self, JoseError> {
        let curve = EllipticCurve::for_parameters(parameters)?;
        Self::from_coordinates(curve, x, y)
    }

    pub fn curve(&self) -> &'static EllipticCurve {
        match self {
            EcPublicKey::P256(_) => &P256,
            EcPublicKey::P384(_) => &P384,
            EcPublicKey::P521(_) => &P521,
        }
    }

    /// The uncompressed SEC1 encoding.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        match self {
            EcPublicKey::P256(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            EcPublicKey::P384(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            EcPublicKey::P521(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
        }
    }
}

// `p521::ecdsa::SigningKey` has no `Signer` impl without the `getrandom` feature.
macro_rules! sign {
    ($curve:ident, $hash:ty, $secret:expr, $input:expr) => {{
        use $curve::ecdsa::signature::hazmat::PrehashSigner;

        let key = $curve::ecdsa::SigningKey::from_bytes(&$secret.to_bytes())
            .map_err(|_| JoseError::InvalidKey)?;
        let digest = <$hash>::digest($input);
        let signature: $curve::ecdsa::Signature = key
            .sign_prehash(&digest)
            .map_err(|_| JoseError::SigningFailed)?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_bytes().to_vec())
    }};
}

macro_rules! verify {
    ($curve:ident, $public:expr, $input:expr, $signature:expr) => {{
        use $curve::ecdsa::signature::Verifier;

        let Ok(signature) = $curve::ecdsa::Signature::from_slice($signature) else {
            return false;
        };
        // high-S signatures are the malleated twin of a valid one
        if signature.normalize_s().is_some() {
            return false;
        }
        let point = $public.to_encoded_point(false);
        match $curve::ecdsa::VerifyingKey::from_sec1_bytes(point.as_bytes()) {
            Ok(key) => key.verify($input, &signature).is_ok(),
            Err(_) => false,
        }
    }};
}

impl SigningKey for EcSecretKey {
    /// Raw `r || s`, normalised to low-S.
    fn sign(&self, alg: JwsAlgorithm, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        if alg.family() != SignatureFamily::Ecdsa {
            return Err(JoseError::UnsupportedAlgorithm(alg.name().to_owned()));
        }
        if alg != self.curve().algorithm() {
            return Err(JoseError::InvalidKey);
        }
        match self {
            EcSecretKey::P256(sk) => sign!(p256, Sha256, sk, signing_input),
            EcSecretKey::P384(sk) => sign!(p384, Sha384, sk, signing_input),
            EcSecretKey::P521(sk) => sign!(p521, Sha512, sk, signing_input),
        }
    }
}

impl VerifyingKey for EcPublicKey {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        if alg != self.curve().algorithm() || signature.len() != self.curve().signature_len() {
            return false;
        }
        match self {
            EcPublicKey::P256(pk) => verify!(p256, pk, signing_input, signature),
            EcPublicKey::P384(pk) => verify!(p384, pk, signing_input, signature),
            EcPublicKey::P521(pk) => verify!(p521, pk, signing_input, signature),
        }
    }
}

impl VerifyingKey for EcSecretKey {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        self.public_key().verify(alg, signing_input, signature)
    }
}
