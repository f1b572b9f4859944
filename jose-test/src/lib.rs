//! Fixtures shared by the integration tests and the benchmarks.

use std::sync::OnceLock;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use jose_core::algorithm::{JwsAlgorithm, SignatureFamily};
use jose_core::jwe::ContentKey;
use jose_core::jws::{SigningKey, VerifyingKey};
use jose_core::{ClaimsSet, JoseError};
use jose_rustcrypto::core::{
    EcPublicKey, EcSecretKey, EllipticCurve, HmacKey, RsaPublicKey, RsaSecretKey,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub fn read_test<Test: DeserializeOwned>(v: &str) -> TestFile<Test> {
    let path = format!("tests/vectors/{v}");
    let file = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&file).unwrap()
}

#[derive(Deserialize)]
pub struct TestFile<T> {
    pub tests: Vec<Test<T>>,
}

#[derive(Deserialize)]
pub struct Test<T> {
    pub name: String,
    #[serde(flatten)]
    pub test_data: T,
}

/// Matches only the JSON boolean `B`, to tell success and failure vectors apart.
#[derive(Debug)]
pub struct Bool<const B: bool>;

impl<'a, const B: bool> Deserialize<'a> for Bool<B> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct BoolVisitor<const B: bool>;

        impl<const B: bool> serde::de::Visitor<'_> for BoolVisitor<B> {
            type Value = Bool<B>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "{B}")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                (v == B)
                    .then_some(Bool)
                    .ok_or_else(|| E::custom(format!("expected {B}, got {v}")))
            }
        }

        deserializer.deserialize_bool(BoolVisitor)
    }
}

fn b64(segment: &str) -> Result<Vec<u8>, JoseError> {
    Base64UrlUnpadded::decode_vec(segment).map_err(|_| JoseError::Base64DecodeError)
}

/// The subset of RFC 7517 JSON Web Keys the vectors use.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kty")]
pub enum Jwk {
    #[serde(rename = "oct")]
    Oct { k: String },
    #[serde(rename = "RSA")]
    Rsa {
        n: String,
        e: String,
        d: Option<String>,
        p: Option<String>,
        q: Option<String>,
    },
    #[serde(rename = "EC")]
    Ec {
        crv: String,
        x: String,
        y: String,
        d: Option<String>,
    },
}

impl Jwk {
    pub fn key(&self) -> Result<TestKey, JoseError> {
        match self {
            Jwk::Oct { k } => Ok(TestKey::Hmac(HmacKey::from_bytes(b64(k)?))),
            Jwk::Rsa { d: None, n, e, .. } => {
                RsaPublicKey::from_components(&b64(n)?, &b64(e)?).map(TestKey::RsaPublic)
            }
            Jwk::Rsa { .. } => self.rsa_secret_key().map(TestKey::RsaSecret),
            Jwk::Ec { crv, x, y, d } => {
                let curve = EllipticCurve::for_name(crv)?;
                let public_key = EcPublicKey::from_coordinates(curve, &b64(x)?, &b64(y)?)?;
                match d {
                    None => Ok(TestKey::EcPublic(public_key)),
                    Some(d) => {
                        let secret_key = EcSecretKey::from_bytes(curve, &b64(d)?)?;
                        if secret_key.public_key() != public_key {
                            return Err(JoseError::InvalidKey);
                        }
                        Ok(TestKey::EcSecret(secret_key))
                    }
                }
            }
        }
    }

    /// The shared key of an `oct` JWK, for `dir`.
    pub fn content_key(&self) -> Result<ContentKey, JoseError> {
        match self {
            Jwk::Oct { k } => Ok(ContentKey::from_bytes(b64(k)?)),
            _ => Err(JoseError::InvalidKey),
        }
    }

    pub fn rsa_secret_key(&self) -> Result<RsaSecretKey, JoseError> {
        match self {
            Jwk::Rsa {
                n,
                e,
                d: Some(d),
                p: Some(p),
                q: Some(q),
            } => RsaSecretKey::from_components(
                &b64(n)?,
                &b64(e)?,
                &b64(d)?,
                &[&b64(p)?, &b64(q)?],
            ),
            _ => Err(JoseError::InvalidKey),
        }
    }
}

/// Any of the signature keys a JWK can describe.
#[derive(Clone, Debug)]
pub enum TestKey {
    Hmac(HmacKey),
    RsaPublic(RsaPublicKey),
    RsaSecret(RsaSecretKey),
    EcPublic(EcPublicKey),
    EcSecret(EcSecretKey),
}

impl TestKey {
    /// A key able to sign `alg`. RSA algorithms share the RFC 7517 key.
    pub fn for_algorithm(alg: JwsAlgorithm) -> Result<Self, JoseError> {
        match alg.family() {
            SignatureFamily::Hmac => {
                let hash = alg.hash().ok_or(JoseError::InvalidKey)?;
                HmacKey::random(hash).map(TestKey::Hmac)
            }
            SignatureFamily::RsaPkcs1 | SignatureFamily::RsaPss => {
                Ok(TestKey::RsaSecret(rfc7517_rsa_key().clone()))
            }
            SignatureFamily::Ecdsa => {
                let curve = EllipticCurve::for_algorithm(alg).ok_or(JoseError::InvalidKey)?;
                EcSecretKey::random(curve).map(TestKey::EcSecret)
            }
            SignatureFamily::None => Err(JoseError::UnsupportedAlgorithm(alg.name().to_owned())),
        }
    }

    /// The key a verifier would hold.
    pub fn verifier(&self) -> TestKey {
        match self {
            TestKey::RsaSecret(key) => TestKey::RsaPublic(key.public_key()),
            TestKey::EcSecret(key) => TestKey::EcPublic(key.public_key()),
            key => key.clone(),
        }
    }

    pub fn can_sign(&self) -> bool {
        matches!(
            self,
            TestKey::Hmac(_) | TestKey::RsaSecret(_) | TestKey::EcSecret(_)
        )
    }
}

impl SigningKey for TestKey {
    fn sign(&self, alg: JwsAlgorithm, signing_input: &[u8]) -> Result<Vec<u8>, JoseError> {
        match self {
            TestKey::Hmac(key) => key.sign(alg, signing_input),
            TestKey::RsaSecret(key) => key.sign(alg, signing_input),
            TestKey::EcSecret(key) => key.sign(alg, signing_input),
            TestKey::RsaPublic(_) | TestKey::EcPublic(_) => Err(JoseError::InvalidKey),
        }
    }
}

impl VerifyingKey for TestKey {
    fn verify(&self, alg: JwsAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        match self {
            TestKey::Hmac(key) => key.verify(alg, signing_input, signature),
            TestKey::RsaPublic(key) => key.verify(alg, signing_input, signature),
            TestKey::RsaSecret(key) => key.verify(alg, signing_input, signature),
            TestKey::EcPublic(key) => key.verify(alg, signing_input, signature),
            TestKey::EcSecret(key) => key.verify(alg, signing_input, signature),
        }
    }
}

/// The example RSA key of RFC 7517, appendix A.2.
pub fn rfc7517_rsa_key() -> &'static RsaSecretKey {
    static KEY: OnceLock<RsaSecretKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let jwk = Jwk::Rsa {
            n: RFC7517_N.to_owned(),
            e: "AQAB".to_owned(),
            d: Some(RFC7517_D.to_owned()),
            p: Some(RFC7517_P.to_owned()),
            q: Some(RFC7517_Q.to_owned()),
        };
        jwk.rsa_secret_key().unwrap()
    })
}

/// An unrelated 2048 bit key, stored as PKCS#8 PEM.
pub fn second_rsa_key() -> &'static RsaSecretKey {
    static KEY: OnceLock<RsaSecretKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaSecretKey::from_pkcs8(include_str!("second_rsa_key.pem").as_bytes()).unwrap()
    })
}

/// A typical access token claims set, valid for an hour from now.
pub fn access_token_claims() -> ClaimsSet {
    let mut claims = ClaimsSet::now(Duration::from_secs(3600)).unwrap();
    claims.set_issuer("https://issuer.example/").unwrap();
    claims.set_subject("alice").unwrap();
    claims.add_audience("api").unwrap();
    claims.set_jwt_id("0f6a1f2e");
    claims
}

const RFC7517_N: &str = "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw";
const RFC7517_D: &str = "X4cTteJY_gn4FYPsXB8rdXix5vwsg1FLN5E3EaG6RJoVH-HLLKD9M7dx5oo7GURknchnrRweUkC7hT5fJLM0WbFAKNLWY2vv7B6NqXSzUvxT0_YSfqijwp3RTzlBaCxWp4doFk5N2o8Gy_nHNKroADIkJ46pRUohsXywbReAdYaMwFs9tv8d_cPVY3i07a3t8MN6TNwm0dSawm9v47UiCl3Sk5ZiG7xojPLu4sbg1U2jx4IBTNBznbJSzFHK66jT8bgkuqsk0GjskDJk19Z4qwjwbsnn4j2WBii3RL-Us2lGVkY8fkFzme1z0HbIkfz0Y6mqnOYtqc0X4jfcKoAC8Q";
const RFC7517_P: &str = "83i-7IvMGXoMXCskv73TKr8637FiO7Z27zv8oj6pbWUQyLPQBQxtPVnwD20R-60eTDmD2ujnMt5PoqMrm8RfmNhVWDtjjMmCMjOpSXicFHj7XOuVIYQyqVWlWEh6dN36GVZYk93N8Bc9vY41xy8B9RzzOGVQzXvNEvn7O0nVbfs";
const RFC7517_Q: &str = "3dfOR9cuYq-0S-mkFLzgItgMEfFzB2q3hWehMuG0oCuqnb3vobLyumqjVZQO1dIrdwgTnCdpYzBcOfW5r370AFXjiWft_NGEiovonizhKpo9VVS78TzFgxkIdrecRezsZ-1kYd_s1qDbxtkDEgfAITAG9LUnADun4vIcb6yelxk";
