//! Token composition and compact serialization.
//!
//! Tokens move through typed states. A builder ([`UnsignedJwt`], [`UnencryptedJwt`])
//! is mutable. Signing or encrypting it produces a frozen token ([`SignedJwt`],
//! [`EncryptedJwt`]) that holds the exact bytes it was built from, so that
//! [`Display`](fmt::Display) reproduces the compact form and verification
//! never re-encodes anything.
//!
//! ```text
//! JWS:    BASE64URL(header).BASE64URL(payload).BASE64URL(signature)
//! JWE:    BASE64URL(header).BASE64URL(encrypted key).BASE64URL(iv).BASE64URL(ciphertext).BASE64URL(tag)
//! nested: a JWS whose payload is a JWE compact string and whose header has `cty: JWT`,
//!         or a JWE whose plaintext is a JWS compact string and whose header has `cty: JWT`
//! ```

use core::fmt;
use core::marker::PhantomData;
use core::str::FromStr;

use tracing::debug;

use crate::JoseError;
use crate::algorithm::{EncryptionMethod, JweAlgorithm, JwsAlgorithm};
use crate::claims::ClaimsSet;
use crate::compression;
use crate::encodings::{self, Payload};
use crate::header::{JweHeader, JwsHeader};
use crate::jwe::{EncryptionResult, JweHandler, KeyManagement};
use crate::jws::{SigningKey, VerifyingKey};
use crate::validation::Validate;

/// An unsecured JWT (`alg: none`).
#[derive(Clone, Debug, PartialEq)]
pub struct PlaintextJwt {
    header: JwsHeader,
    claims: ClaimsSet,
    encoded: String,
}

impl PlaintextJwt {
    pub fn new(claims: ClaimsSet) -> Result<Self, JoseError> {
        Self::with_header(JwsHeader::new(JwsAlgorithm::None), claims)
    }

    /// Build from a custom header. The header's `alg` is forced to `none`.
    pub fn with_header(mut header: JwsHeader, claims: ClaimsSet) -> Result<Self, JoseError> {
        header.set_algorithm(JwsAlgorithm::None);
        let encoded = format!(
            "{}.{}.",
            header.encode()?,
            encodings::encode(&claims.to_json()?)
        );
        Ok(Self {
            header,
            claims,
            encoded,
        })
    }

    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    pub fn claims(&self) -> &ClaimsSet {
        &self.claims
    }
}

impl FromStr for PlaintextJwt {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [header_segment, payload, signature] = encodings::split_segments::<3>(s)?;
        if !signature.is_empty() {
            return Err(JoseError::InvalidToken);
        }
        let header = JwsHeader::decode(header_segment)?;
        if header.algorithm()? != JwsAlgorithm::None {
            return Err(JoseError::InvalidToken);
        }
        let claims = ClaimsSet::from_json(&encodings::decode(payload)?)?;
        Ok(Self {
            header,
            claims,
            encoded: s.to_owned(),
        })
    }
}

impl fmt::Display for PlaintextJwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// A JWS that has not been signed yet.
#[derive(Clone, Debug)]
pub struct UnsignedJwt<P = ClaimsSet> {
    header: JwsHeader,
    payload: P,
}

impl<P: Payload> UnsignedJwt<P> {
    pub fn new(header: JwsHeader, payload: P) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut JwsHeader {
        &mut self.header
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Sign the token with the algorithm named in its header.
    ///
    /// Nested payloads set the `cty` header to announce themselves.
    pub fn sign(mut self, key: &(impl SigningKey + ?Sized)) -> Result<SignedJwt<P>, JoseError> {
        let alg = self.header.algorithm()?;
        if alg == JwsAlgorithm::None {
            return Err(JoseError::Configuration(
                "unsecured tokens are built with PlaintextJwt",
            ));
        }
        if let Some(cty) = P::CONTENT_TYPE {
            self.header.set_content_type(cty);
        }

        let signing_input = format!(
            "{}.{}",
            self.header.encode()?,
            encodings::encode(&self.payload.encode()?)
        );
        let signature = key.sign(alg, signing_input.as_bytes())?;
        debug!(%alg, "signed token");

        Ok(SignedJwt {
            header: self.header,
            payload: self.payload,
            signing_input,
            signature,
        })
    }
}

/// A signed JWS, either freshly signed or parsed from its compact form.
#[derive(Clone, Debug)]
pub struct SignedJwt<P = ClaimsSet> {
    header: JwsHeader,
    payload: P,
    signing_input: String,
    signature: Vec<u8>,
}

/// A JWE nested inside a JWS (encrypt-then-sign).
pub type SignedEncryptedJwt = SignedJwt<EncryptedJwt>;

impl<P> SignedJwt<P> {
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The first two segments of the compact form, exactly as signed or received.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// Check the signature against the stored signing input.
    ///
    /// Payload access does not depend on this. Callers must check the result.
    pub fn verify(&self, key: &(impl VerifyingKey + ?Sized)) -> bool {
        let Ok(alg) = self.header.algorithm() else {
            return false;
        };
        let valid = alg != JwsAlgorithm::None
            && key.verify(alg, self.signing_input.as_bytes(), &self.signature);
        debug!(%alg, valid, "verified token signature");
        valid
    }
}

impl<P: Payload> SignedJwt<P> {
    /// Parse and verify a compact token. Malformed input is a failed verification.
    pub fn verify_str(token: &str, key: &(impl VerifyingKey + ?Sized)) -> bool {
        token.parse::<Self>().is_ok_and(|jwt| jwt.verify(key))
    }
}

impl SignedJwt<ClaimsSet> {
    pub fn claims(&self) -> &ClaimsSet {
        &self.payload
    }

    /// Verify the signature, then validate the claims.
    pub fn verify_and_validate(
        &self,
        key: &(impl VerifyingKey + ?Sized),
        validation: &impl Validate<Claims = ClaimsSet>,
    ) -> Result<&ClaimsSet, JoseError> {
        if !self.verify(key) {
            return Err(JoseError::VerificationFailed);
        }
        validation.validate(&self.payload)?;
        Ok(&self.payload)
    }
}

impl SignedJwt<EncryptedJwt> {
    pub fn encrypted(&self) -> &EncryptedJwt {
        &self.payload
    }

    /// Decrypt the nested token. This does not check the outer signature.
    pub fn decrypt<K: KeyManagement>(
        &self,
        handler: &JweHandler<K>,
        key: &K::DecryptionKey,
    ) -> Result<ClaimsSet, JoseError> {
        self.payload.decrypt(handler, key)
    }

    /// Verify the outer signature, then decrypt the nested token.
    pub fn verify_and_decrypt<K: KeyManagement>(
        &self,
        verifier: &(impl VerifyingKey + ?Sized),
        handler: &JweHandler<K>,
        key: &K::DecryptionKey,
    ) -> Result<ClaimsSet, JoseError> {
        if !self.verify(verifier) {
            return Err(JoseError::VerificationFailed);
        }
        self.payload.decrypt(handler, key)
    }
}

impl<P: Payload> FromStr for SignedJwt<P> {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [header_segment, payload_segment, signature] = encodings::split_segments::<3>(s)?;
        let header = JwsHeader::decode(header_segment)?;
        if header.algorithm()? == JwsAlgorithm::None {
            return Err(JoseError::InvalidToken);
        }
        let payload = P::decode(&encodings::decode(payload_segment)?)?;
        let signature = encodings::decode(signature)?;
        let signing_input = s[..header_segment.len() + 1 + payload_segment.len()].to_owned();

        Ok(Self {
            header,
            payload,
            signing_input,
            signature,
        })
    }
}

impl<P> fmt::Display for SignedJwt<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.signing_input,
            encodings::encode(&self.signature)
        )
    }
}

/// A JWE that has not been encrypted yet.
#[derive(Clone, Debug)]
pub struct UnencryptedJwt<P = ClaimsSet> {
    header: JweHeader,
    payload: P,
}

fn check_handler<K: KeyManagement>(
    handler: &JweHandler<K>,
    alg: JweAlgorithm,
    enc: EncryptionMethod,
) -> Result<(), JoseError> {
    if handler.algorithm() != alg || handler.method() != enc {
        return Err(JoseError::Configuration(
            "the handler does not match the token's alg and enc",
        ));
    }
    Ok(())
}

impl<P: Payload> UnencryptedJwt<P> {
    pub fn new(header: JweHeader, payload: P) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &JweHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut JweHeader {
        &mut self.header
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Encrypt the payload for the holder of the decryption key matching `key`.
    ///
    /// The encoded header is the additional authenticated data. Nested payloads set
    /// the `cty` header to announce themselves.
    pub fn encrypt<K: KeyManagement>(
        mut self,
        handler: &JweHandler<K>,
        key: &K::EncryptionKey,
    ) -> Result<EncryptedJwt<P>, JoseError> {
        let alg = self.header.algorithm()?;
        let enc = self.header.encryption_method()?;
        check_handler(handler, alg, enc)?;
        let zip = self.header.compression()?;
        if let Some(cty) = P::CONTENT_TYPE {
            self.header.set_content_type(cty);
        }

        let encoded_header = self.header.encode()?;
        let cek = handler.content_encryption_key(key)?;
        let encrypted_key = handler.generate_encrypted_key(key, &cek)?;
        let iv = handler.generate_iv()?;
        let plaintext = compression::compress(zip, self.payload.encode()?)?;
        let result = handler.encrypt(&cek, &iv, &plaintext, encoded_header.as_bytes())?;
        debug!(%alg, %enc, "encrypted token");

        Ok(EncryptedJwt {
            header: self.header,
            encoded_header,
            encrypted_key,
            iv,
            result,
            payload: PhantomData,
        })
    }
}

impl UnencryptedJwt<ClaimsSet> {
    pub fn claims(&self) -> &ClaimsSet {
        &self.payload
    }

    pub fn claims_mut(&mut self) -> &mut ClaimsSet {
        &mut self.payload
    }
}

/// An encrypted JWE, either freshly encrypted or parsed from its compact form.
///
/// `P` is what decryption yields: a claims set, or a signed token for
/// sign-then-encrypt nesting.
pub struct EncryptedJwt<P = ClaimsSet> {
    header: JweHeader,
    encoded_header: String,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    result: EncryptionResult,
    payload: PhantomData<fn() -> P>,
}

/// A JWS nested inside a JWE (sign-then-encrypt).
pub type SignedThenEncryptedJwt = EncryptedJwt<SignedJwt>;

impl<P> Clone for EncryptedJwt<P> {
    fn clone(&self) -> Self {
        Self {
            header: self.header.clone(),
            encoded_header: self.encoded_header.clone(),
            encrypted_key: self.encrypted_key.clone(),
            iv: self.iv.clone(),
            result: self.result.clone(),
            payload: PhantomData,
        }
    }
}

impl<P> PartialEq for EncryptedJwt<P> {
    fn eq(&self, other: &Self) -> bool {
        self.encoded_header == other.encoded_header
            && self.encrypted_key == other.encrypted_key
            && self.iv == other.iv
            && self.result == other.result
    }
}

impl<P> fmt::Debug for EncryptedJwt<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedJwt")
            .field("header", &self.header)
            .field("encrypted_key", &self.encrypted_key)
            .field("iv", &self.iv)
            .field("result", &self.result)
            .finish()
    }
}

impl<P> EncryptedJwt<P> {
    pub fn header(&self) -> &JweHeader {
        &self.header
    }

    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn encryption_result(&self) -> &EncryptionResult {
        &self.result
    }
}

impl<P: Payload> EncryptedJwt<P> {
    /// Unwrap the content encryption key, then authenticate and decrypt the payload.
    pub fn decrypt<K: KeyManagement>(
        &self,
        handler: &JweHandler<K>,
        key: &K::DecryptionKey,
    ) -> Result<P, JoseError> {
        let alg = self.header.algorithm()?;
        let enc = self.header.encryption_method()?;
        check_handler(handler, alg, enc)?;
        let zip = self.header.compression()?;

        let plaintext = handler
            .decrypt_content_encryption_key(key, &self.encrypted_key)
            .and_then(|cek| {
                handler.decrypt(&cek, &self.iv, &self.result, self.encoded_header.as_bytes())
            })
            .inspect_err(|_| debug!(%alg, %enc, "token decryption failed"))?;
        debug!(%alg, %enc, "decrypted token");

        P::decode(&compression::decompress(zip, plaintext)?)
    }
}

impl EncryptedJwt<ClaimsSet> {
    pub fn decrypt_and_validate<K: KeyManagement>(
        &self,
        handler: &JweHandler<K>,
        key: &K::DecryptionKey,
        validation: &impl Validate<Claims = ClaimsSet>,
    ) -> Result<ClaimsSet, JoseError> {
        let claims = self.decrypt(handler, key)?;
        validation.validate(&claims)?;
        Ok(claims)
    }
}

impl EncryptedJwt<SignedJwt> {
    /// Decrypt the nested token, then check its signature.
    pub fn decrypt_and_verify<K: KeyManagement>(
        &self,
        handler: &JweHandler<K>,
        key: &K::DecryptionKey,
        verifier: &(impl VerifyingKey + ?Sized),
    ) -> Result<SignedJwt, JoseError> {
        let jws = self.decrypt(handler, key)?;
        if !jws.verify(verifier) {
            return Err(JoseError::VerificationFailed);
        }
        Ok(jws)
    }
}

impl<P> FromStr for EncryptedJwt<P> {
    type Err = JoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [header_segment, encrypted_key, iv, ciphertext, tag] =
            encodings::split_segments::<5>(s)?;
        let header = JweHeader::decode(header_segment)?;
        header.algorithm()?;
        header.encryption_method()?;

        Ok(Self {
            header,
            encoded_header: header_segment.to_owned(),
            encrypted_key: encodings::decode(encrypted_key)?,
            iv: encodings::decode(iv)?,
            result: EncryptionResult::new(
                encodings::decode(ciphertext)?,
                encodings::decode(tag)?,
            ),
            payload: PhantomData,
        })
    }
}

impl<P> fmt::Display for EncryptedJwt<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}",
            self.encoded_header,
            encodings::encode(&self.encrypted_key),
            encodings::encode(&self.iv),
            encodings::encode(self.result.ciphertext()),
            encodings::encode(self.result.tag()),
        )
    }
}

fn compact_payload<T: FromStr<Err = JoseError>>(payload: &[u8]) -> Result<T, JoseError> {
    core::str::from_utf8(payload)
        .map_err(|_| JoseError::InvalidToken)?
        .parse()
}

// Only claims-carrying tokens nest, so nesting stops at one level.
impl Payload for EncryptedJwt<ClaimsSet> {
    const CONTENT_TYPE: Option<&'static str> = Some("JWT");

    fn encode(&self) -> Result<Vec<u8>, JoseError> {
        Ok(self.to_string().into_bytes())
    }

    fn decode(payload: &[u8]) -> Result<Self, JoseError> {
        compact_payload(payload)
    }
}

impl Payload for SignedJwt<ClaimsSet> {
    const CONTENT_TYPE: Option<&'static str> = Some("JWT");

    fn encode(&self) -> Result<Vec<u8>, JoseError> {
        Ok(self.to_string().into_bytes())
    }

    fn decode(payload: &[u8]) -> Result<Self, JoseError> {
        compact_payload(payload)
    }
}

fn is_nested(header_value: Option<&str>, names: &[&str]) -> bool {
    header_value.is_some_and(|v| names.iter().any(|name| v.eq_ignore_ascii_case(name)))
}

/// Any token, as identified by [`Token::from_str`].
#[derive(Clone, Debug)]
pub enum Token {
    Plaintext(PlaintextJwt),
    Signed(SignedJwt),
    Encrypted(EncryptedJwt),
    SignedEncrypted(SignedEncryptedJwt),
    SignedThenEncrypted(SignedThenEncryptedJwt),
}

impl FromStr for Token {
    type Err = JoseError;

    /// Reconstruct a token from its compact form.
    ///
    /// Five segments are a JWE, which wraps a signed token when its `cty` is `JWT`.
    /// Three segments are a JWS. It is unsecured when its `alg` is `none`, and wraps
    /// an encrypted token when its `cty` is `JWT` or `JWE`, or its `typ` is `JWE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (header_segment, _) = s.split_once('.').ok_or(JoseError::InvalidToken)?;
        match encodings::segment_count(s) {
            5 => {
                let header = JweHeader::decode(header_segment)?;
                if is_nested(header.content_type(), &["JWT"]) {
                    Ok(Token::SignedThenEncrypted(s.parse()?))
                } else {
                    Ok(Token::Encrypted(s.parse()?))
                }
            }
            3 => {
                let header = JwsHeader::decode(header_segment)?;
                let nested = is_nested(header.content_type(), &["JWT", "JWE"])
                    || is_nested(header.token_type(), &["JWE"]);

                if header.algorithm()? == JwsAlgorithm::None {
                    Ok(Token::Plaintext(s.parse()?))
                } else if nested {
                    Ok(Token::SignedEncrypted(s.parse()?))
                } else {
                    Ok(Token::Signed(s.parse()?))
                }
            }
            _ => Err(JoseError::InvalidToken),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Plaintext(jwt) => jwt.fmt(f),
            Token::Signed(jwt) => jwt.fmt(f),
            Token::Encrypted(jwt) => jwt.fmt(f),
            Token::SignedEncrypted(jwt) => jwt.fmt(f),
            Token::SignedThenEncrypted(jwt) => jwt.fmt(f),
        }
    }
}
