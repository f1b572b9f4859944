//! The JWT claims set.

use std::time::Duration;

use jiff::Timestamp;
use serde_json::{Map, Value};
use url::Url;

use crate::JoseError;
use crate::encodings::Payload;
use crate::header::Parameters;

/// Registered claim names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimKey {
    Issuer,
    Subject,
    Audience,
    ExpirationTime,
    NotBefore,
    IssuedAt,
    JwtId,
    Type,
    Custom,
}

impl ClaimKey {
    const RESERVED: [(&'static str, ClaimKey); 8] = [
        ("iss", ClaimKey::Issuer),
        ("sub", ClaimKey::Subject),
        ("aud", ClaimKey::Audience),
        ("exp", ClaimKey::ExpirationTime),
        ("nbf", ClaimKey::NotBefore),
        ("iat", ClaimKey::IssuedAt),
        ("jti", ClaimKey::JwtId),
        ("typ", ClaimKey::Type),
    ];

    /// Resolve a claim name, ignoring ASCII case. Names outside the registry are
    /// [`ClaimKey::Custom`].
    pub fn lookup(name: &str) -> Self {
        Self::RESERVED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map_or(ClaimKey::Custom, |(_, key)| *key)
    }

    /// The name a claim is stored under: the registered spelling for reserved
    /// claims, otherwise `name` itself.
    pub fn normalize(name: &str) -> &str {
        match Self::lookup(name) {
            ClaimKey::Custom => name,
            key => key.name(),
        }
    }

    pub fn name(self) -> &'static str {
        Self::RESERVED
            .iter()
            .find(|(_, key)| *key == self)
            .map_or("", |(n, _)| *n)
    }
}

/// Check that `value` is a StringOrURI.
///
/// Any string is allowed, except that a string containing a `:` must be a URI.
pub fn validate_string_or_uri(value: &str) -> Result<(), JoseError> {
    if value.contains(':') && Url::parse(value).is_err() {
        return Err(JoseError::InvalidClaim(format!("{value:?} is not a valid URI")));
    }
    Ok(())
}

/// Seconds since the epoch, truncated to whole seconds.
pub fn to_int_date(time: Timestamp) -> i64 {
    time.as_second()
}

pub fn from_int_date(seconds: i64) -> Result<Timestamp, JoseError> {
    Timestamp::from_second(seconds)
        .map_err(|_| JoseError::InvalidClaim(format!("{seconds} is out of range")))
}

fn int_date_value(key: &str, value: &Value) -> Result<i64, JoseError> {
    let seconds = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        _ => None,
    };
    let seconds = seconds.ok_or_else(|| JoseError::InvalidClaim(key.to_owned()))?;
    from_int_date(seconds)?;
    Ok(seconds)
}

/// A JWT claims set: an ordered JSON object with typed access to the registered claims.
///
/// ```
/// use jose_core::ClaimsSet;
///
/// let mut claims = ClaimsSet::default();
/// claims.set_issuer("urn:example:issuer")?;
/// claims.add_audience("a")?;
/// claims.add_audience("b")?;
/// assert_eq!(claims.audience(), Some(vec!["a", "b"]));
///
/// assert!(claims.set_subject("not a uri:").is_err());
/// # Ok::<(), jose_core::JoseError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClaimsSet {
    claims: Map<String, Value>,
}

impl ClaimsSet {
    /// Claims issued at `now`, valid from `now` until `now + ttl`.
    ///
    /// Fails if the expiration time is past the largest representable timestamp.
    pub fn new(now: Timestamp, ttl: Duration) -> Result<Self, JoseError> {
        let exp = now
            .checked_add(ttl)
            .map_err(|_| JoseError::InvalidClaim("exp".to_owned()))?;
        let mut claims = Self::default();
        claims.set_issued_at(now);
        claims.set_not_before(now);
        claims.set_expiration_time(exp);
        Ok(claims)
    }

    /// Claims issued now, valid for `ttl`.
    pub fn now(ttl: Duration) -> Result<Self, JoseError> {
        Self::new(Timestamp::now(), ttl)
    }

    fn string(&self, key: ClaimKey) -> Option<&str> {
        self.claims.get(key.name())?.as_str()
    }

    fn set_string(&mut self, key: ClaimKey, value: String) {
        self.claims.insert(key.name().to_owned(), Value::String(value));
    }

    fn date(&self, key: ClaimKey) -> Option<Timestamp> {
        let seconds = int_date_value(key.name(), self.claims.get(key.name())?).ok()?;
        from_int_date(seconds).ok()
    }

    fn set_date(&mut self, key: ClaimKey, time: Timestamp) {
        self.claims
            .insert(key.name().to_owned(), Value::from(to_int_date(time)));
    }

    pub fn issuer(&self) -> Option<&str> {
        self.string(ClaimKey::Issuer)
    }

    pub fn set_issuer(&mut self, iss: impl Into<String>) -> Result<(), JoseError> {
        let iss = iss.into();
        validate_string_or_uri(&iss)?;
        self.set_string(ClaimKey::Issuer, iss);
        Ok(())
    }

    pub fn set_issuer_uri(&mut self, iss: &Url) {
        self.set_string(ClaimKey::Issuer, iss.as_str().to_owned());
    }

    pub fn subject(&self) -> Option<&str> {
        self.string(ClaimKey::Subject)
    }

    pub fn set_subject(&mut self, sub: impl Into<String>) -> Result<(), JoseError> {
        let sub = sub.into();
        validate_string_or_uri(&sub)?;
        self.set_string(ClaimKey::Subject, sub);
        Ok(())
    }

    pub fn set_subject_uri(&mut self, sub: &Url) {
        self.set_string(ClaimKey::Subject, sub.as_str().to_owned());
    }

    /// The audience, whether it was stored as a single value or a list.
    pub fn audience(&self) -> Option<Vec<&str>> {
        match self.claims.get("aud")? {
            Value::String(aud) => Some(vec![aud.as_str()]),
            Value::Array(list) => Some(list.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }

    /// Add an audience.
    ///
    /// A single audience is stored as a plain string. Adding a second turns it into a list.
    pub fn add_audience(&mut self, aud: impl Into<String>) -> Result<(), JoseError> {
        let aud = aud.into();
        validate_string_or_uri(&aud)?;
        self.push_audience(aud);
        Ok(())
    }

    pub fn add_audience_uri(&mut self, aud: &Url) {
        self.push_audience(aud.as_str().to_owned());
    }

    fn push_audience(&mut self, aud: String) {
        let entry = self.claims.entry("aud").or_insert(Value::Null);
        *entry = match entry.take() {
            Value::Null => Value::String(aud),
            Value::Array(list) if list.is_empty() => Value::String(aud),
            Value::Array(mut list) => {
                list.push(Value::String(aud));
                Value::Array(list)
            }
            existing => Value::Array(vec![existing, Value::String(aud)]),
        };
    }

    pub fn expiration_time(&self) -> Option<Timestamp> {
        self.date(ClaimKey::ExpirationTime)
    }

    pub fn set_expiration_time(&mut self, exp: Timestamp) {
        self.set_date(ClaimKey::ExpirationTime, exp);
    }

    pub fn not_before(&self) -> Option<Timestamp> {
        self.date(ClaimKey::NotBefore)
    }

    pub fn set_not_before(&mut self, nbf: Timestamp) {
        self.set_date(ClaimKey::NotBefore, nbf);
    }

    pub fn issued_at(&self) -> Option<Timestamp> {
        self.date(ClaimKey::IssuedAt)
    }

    pub fn set_issued_at(&mut self, iat: Timestamp) {
        self.set_date(ClaimKey::IssuedAt, iat);
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.string(ClaimKey::JwtId)
    }

    pub fn set_jwt_id(&mut self, jti: impl Into<String>) {
        self.set_string(ClaimKey::JwtId, jti.into());
    }

    pub fn token_type(&self) -> Option<&str> {
        self.string(ClaimKey::Type)
    }

    pub fn set_token_type(&mut self, typ: impl Into<String>) {
        self.set_string(ClaimKey::Type, typ.into());
    }

    pub fn to_json(&self) -> Result<Vec<u8>, JoseError> {
        Ok(serde_json::to_vec(&self.claims)?)
    }

    /// Parse a claims set, validating every registered claim.
    pub fn from_json(json: &[u8]) -> Result<Self, JoseError> {
        let claims: Map<String, Value> = serde_json::from_slice(json)?;
        Self::try_from(claims)
    }
}

impl TryFrom<Map<String, Value>> for ClaimsSet {
    type Error = JoseError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut claims = Self::default();
        for (key, value) in map {
            claims.put(&key, value)?;
        }
        Ok(claims)
    }
}

impl Parameters for ClaimsSet {
    fn get(&self, key: &str) -> Option<&Value> {
        self.claims.get(ClaimKey::normalize(key))
    }

    /// Set a claim. Reserved names are matched regardless of ASCII case and stored
    /// under their registered spelling. Setting `aud` appends to the audience.
    fn put(&mut self, key: &str, value: Value) -> Result<(), JoseError> {
        let key = ClaimKey::normalize(key);
        let invalid = || JoseError::InvalidClaim(key.to_owned());
        match ClaimKey::lookup(key) {
            ClaimKey::Issuer => self.set_issuer(value.as_str().ok_or_else(invalid)?),
            ClaimKey::Subject => self.set_subject(value.as_str().ok_or_else(invalid)?),
            ClaimKey::Audience => {
                let audiences: Vec<String> = match value {
                    Value::String(aud) => vec![aud],
                    Value::Array(list) => list
                        .into_iter()
                        .map(|v| match v {
                            Value::String(aud) => Ok(aud),
                            _ => Err(invalid()),
                        })
                        .collect::<Result<_, _>>()?,
                    _ => return Err(invalid()),
                };
                // all or nothing
                for aud in &audiences {
                    validate_string_or_uri(aud)?;
                }
                for aud in audiences {
                    self.push_audience(aud);
                }
                Ok(())
            }
            ClaimKey::ExpirationTime | ClaimKey::NotBefore | ClaimKey::IssuedAt => {
                let seconds = int_date_value(key, &value)?;
                self.claims.insert(key.to_owned(), Value::from(seconds));
                Ok(())
            }
            ClaimKey::JwtId | ClaimKey::Type => {
                if !value.is_string() {
                    return Err(invalid());
                }
                self.claims.insert(key.to_owned(), value);
                Ok(())
            }
            ClaimKey::Custom => {
                self.claims.insert(key.to_owned(), value);
                Ok(())
            }
        }
    }

    fn get_all(&self) -> &Map<String, Value> {
        &self.claims
    }
}

impl Payload for ClaimsSet {
    const CONTENT_TYPE: Option<&'static str> = None;

    fn encode(&self) -> Result<Vec<u8>, JoseError> {
        self.to_json()
    }

    fn decode(payload: &[u8]) -> Result<Self, JoseError> {
        Self::from_json(payload)
    }
}
