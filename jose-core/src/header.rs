//! JOSE headers.
//!
//! A header is an ordered JSON object. The registered parameters have typed accessors
//! and are validated on every write, while any other parameter is carried through
//! untouched.

use core::fmt;
use core::marker::PhantomData;
use core::str::FromStr;

use serde_json::{Map, Value};

use crate::JoseError;
use crate::algorithm::{Algorithm, CompressionAlgorithm, EncryptionMethod, JweAlgorithm, JwsAlgorithm};
use crate::encodings;

/// Uniform access to the parameters of a header or a claims set.
pub trait Parameters {
    /// Get the raw value of a parameter.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Set a parameter.
    ///
    /// Registered names are validated as if their typed setter had been called.
    fn put(&mut self, key: &str, value: Value) -> Result<(), JoseError>;

    /// All parameters, in insertion order.
    fn get_all(&self) -> &Map<String, Value>;
}

/// Registered header parameter names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderKey {
    Type,
    Algorithm,
    ContentType,
    KeyId,
    EncryptionMethod,
    Compression,
    Custom,
}

impl HeaderKey {
    const RESERVED: [(&'static str, HeaderKey); 6] = [
        ("typ", HeaderKey::Type),
        ("alg", HeaderKey::Algorithm),
        ("cty", HeaderKey::ContentType),
        ("kid", HeaderKey::KeyId),
        ("enc", HeaderKey::EncryptionMethod),
        ("zip", HeaderKey::Compression),
    ];

    /// Resolve a parameter name, ignoring ASCII case. Names outside the registry are
    /// [`HeaderKey::Custom`].
    pub fn lookup(name: &str) -> Self {
        Self::RESERVED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map_or(HeaderKey::Custom, |(_, key)| *key)
    }

    pub fn name(self) -> Option<&'static str> {
        Self::RESERVED
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(n, _)| *n)
    }
}

/// A JOSE header whose `alg` is an `A`.
pub struct Header<A> {
    params: Map<String, Value>,
    algorithm: PhantomData<A>,
}

/// Header of a signed (or unsecured) token.
pub type JwsHeader = Header<JwsAlgorithm>;

/// Header of an encrypted token.
pub type JweHeader = Header<JweAlgorithm>;

impl<A> Clone for Header<A> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            algorithm: PhantomData,
        }
    }
}

impl<A> PartialEq for Header<A> {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

impl<A> fmt::Debug for Header<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Header").field(&self.params).finish()
    }
}

fn parse_value<T: FromStr<Err = JoseError>>(key: &str, value: &Value) -> Result<T, JoseError> {
    value
        .as_str()
        .ok_or_else(|| JoseError::InvalidHeader(key.to_owned()))?
        .parse()
}

impl<A: Algorithm> Header<A> {
    fn empty() -> Self {
        Self {
            params: Map::new(),
            algorithm: PhantomData,
        }
    }

    fn with_algorithm(alg: A) -> Self {
        let mut header = Self::empty();
        header.set_algorithm(alg);
        header.set_token_type("JWT");
        header
    }

    fn key(name: &str) -> HeaderKey {
        match HeaderKey::lookup(name) {
            HeaderKey::EncryptionMethod | HeaderKey::Compression if !A::ENCRYPTED => HeaderKey::Custom,
            key => key,
        }
    }

    /// The registered spelling of a reserved parameter, otherwise `name` itself.
    fn normalize(name: &str) -> &str {
        Self::key(name).name().map_or(name, |registered| registered)
    }

    fn string(&self, key: HeaderKey) -> Option<&str> {
        self.params.get(key.name()?)?.as_str()
    }

    fn set_string(&mut self, key: HeaderKey, value: String) {
        if let Some(name) = key.name() {
            self.params.insert(name.to_owned(), Value::String(value));
        }
    }

    fn required<T: FromStr<Err = JoseError>>(&self, key: HeaderKey) -> Result<T, JoseError> {
        let name = key.name().unwrap_or_default();
        let value = self
            .params
            .get(name)
            .ok_or_else(|| JoseError::InvalidHeader(name.to_owned()))?;
        parse_value(name, value)
    }

    pub fn algorithm(&self) -> Result<A, JoseError> {
        self.required(HeaderKey::Algorithm)
    }

    pub fn set_algorithm(&mut self, alg: A) {
        self.set_string(HeaderKey::Algorithm, alg.name().to_owned());
    }

    pub fn token_type(&self) -> Option<&str> {
        self.string(HeaderKey::Type)
    }

    pub fn set_token_type(&mut self, typ: impl Into<String>) {
        self.set_string(HeaderKey::Type, typ.into());
    }

    pub fn content_type(&self) -> Option<&str> {
        self.string(HeaderKey::ContentType)
    }

    pub fn set_content_type(&mut self, cty: impl Into<String>) {
        self.set_string(HeaderKey::ContentType, cty.into());
    }

    pub fn key_id(&self) -> Option<&str> {
        self.string(HeaderKey::KeyId)
    }

    pub fn set_key_id(&mut self, kid: impl Into<String>) {
        self.set_string(HeaderKey::KeyId, kid.into());
    }

    pub fn to_json(&self) -> Result<Vec<u8>, JoseError> {
        Ok(serde_json::to_vec(&self.params)?)
    }

    /// Parse a header, validating every registered parameter.
    pub fn from_json(json: &[u8]) -> Result<Self, JoseError> {
        let params: Map<String, Value> = serde_json::from_slice(json)?;
        let mut header = Self::empty();
        for (key, value) in params {
            header.put(&key, value)?;
        }
        Ok(header)
    }

    /// The base64url encoded JSON, as it appears in a compact token.
    pub fn encode(&self) -> Result<String, JoseError> {
        Ok(encodings::encode(&self.to_json()?))
    }

    pub fn decode(segment: &str) -> Result<Self, JoseError> {
        Self::from_json(&encodings::decode(segment)?)
    }
}

impl<A: Algorithm> Parameters for Header<A> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(Self::normalize(key))
    }

    /// Reserved names are matched regardless of ASCII case and stored under their
    /// registered spelling.
    fn put(&mut self, key: &str, value: Value) -> Result<(), JoseError> {
        let key = Self::normalize(key);
        match Self::key(key) {
            HeaderKey::Algorithm => {
                parse_value::<A>(key, &value)?;
            }
            HeaderKey::EncryptionMethod => {
                parse_value::<EncryptionMethod>(key, &value)?;
            }
            HeaderKey::Compression => {
                parse_value::<CompressionAlgorithm>(key, &value)?;
            }
            HeaderKey::Type | HeaderKey::ContentType | HeaderKey::KeyId => {
                if !value.is_string() {
                    return Err(JoseError::InvalidHeader(key.to_owned()));
                }
            }
            HeaderKey::Custom => {}
        }
        self.params.insert(key.to_owned(), value);
        Ok(())
    }

    fn get_all(&self) -> &Map<String, Value> {
        &self.params
    }
}

impl Header<JwsAlgorithm> {
    /// A header for `alg`, with `typ` set to `JWT`.
    pub fn new(alg: JwsAlgorithm) -> Self {
        Self::with_algorithm(alg)
    }
}

impl Header<JweAlgorithm> {
    /// A header for `alg` and `enc`, with `typ` set to `JWT`.
    pub fn new(alg: JweAlgorithm, enc: EncryptionMethod) -> Self {
        let mut header = Self::with_algorithm(alg);
        header.set_encryption_method(enc);
        header
    }

    pub fn encryption_method(&self) -> Result<EncryptionMethod, JoseError> {
        self.required(HeaderKey::EncryptionMethod)
    }

    pub fn set_encryption_method(&mut self, enc: EncryptionMethod) {
        self.set_string(HeaderKey::EncryptionMethod, enc.name().to_owned());
    }

    pub fn compression(&self) -> Result<Option<CompressionAlgorithm>, JoseError> {
        match self.params.get("zip") {
            Some(value) => parse_value("zip", value).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_compression(&mut self, zip: Option<CompressionAlgorithm>) {
        match zip {
            Some(zip) => self.set_string(HeaderKey::Compression, zip.name().to_owned()),
            None => {
                self.params.shift_remove("zip");
            }
        }
    }
}
