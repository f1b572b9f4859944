//! Claim validation applied after a token has been verified or decrypted.

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;

use crate::JoseError;
use crate::claims::ClaimsSet;

pub trait Validate {
    /// The type of claim that can be validated
    type Claims;

    /// The validation to perform on the claims
    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError>;

    /// Extend the validation with another validation.
    fn then<V>(self, other: V) -> impl Validate<Claims = Self::Claims>
    where
        Self: Sized,
        V: Validate<Claims = Self::Claims>,
    {
        ValidateThen(self, other)
    }
}

/// Accepts any claims.
pub struct NoValidation;

impl NoValidation {
    pub fn dangerous_no_validation() -> Self {
        NoValidation
    }
}

impl Validate for NoValidation {
    type Claims = ClaimsSet;

    fn validate(&self, _: &ClaimsSet) -> Result<(), JoseError> {
        Ok(())
    }
}

struct ValidateThen<T, U>(T, U);

impl<T: Validate, U: Validate<Claims = T::Claims>> Validate for ValidateThen<T, U> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        self.0.validate(claims)?;
        self.1.validate(claims)
    }
}

impl<T: Validate> Validate for Vec<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        <[T]>::validate(self, claims)
    }
}

impl<T: Validate> Validate for [T] {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        self.iter().try_for_each(|v| v.validate(claims))
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        T::validate(self, claims)
    }
}

impl<T: Validate + ?Sized> Validate for Arc<T> {
    type Claims = T::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        T::validate(self, claims)
    }
}

/// Checks `exp` and `nbf` against a point in time.
pub struct Time {
    now: Timestamp,
}

impl Time {
    pub fn valid_now() -> Self {
        Self {
            now: Timestamp::now(),
        }
    }

    pub fn valid_at(now: Timestamp) -> Self {
        Self { now }
    }

    pub fn with_leeway(self, leeway: Duration) -> TimeWithLeeway {
        TimeWithLeeway {
            now: self.now,
            leeway,
        }
    }
}

impl Validate for Time {
    type Claims = ClaimsSet;

    fn validate(&self, claims: &ClaimsSet) -> Result<(), JoseError> {
        TimeWithLeeway {
            now: self.now,
            leeway: Duration::ZERO,
        }
        .validate(claims)
    }
}

pub struct TimeWithLeeway {
    now: Timestamp,
    leeway: Duration,
}

impl Validate for TimeWithLeeway {
    type Claims = ClaimsSet;

    fn validate(&self, claims: &ClaimsSet) -> Result<(), JoseError> {
        if let Some(exp) = claims.expiration_time()
            && exp < self.now - self.leeway
        {
            return Err(JoseError::ClaimsError);
        }

        if let Some(nbf) = claims.not_before()
            && self.now + self.leeway < nbf
        {
            return Err(JoseError::ClaimsError);
        }

        Ok(())
    }
}

/// Requires an `exp` claim.
pub struct HasExpiry;

impl Validate for HasExpiry {
    type Claims = ClaimsSet;

    fn validate(&self, claims: &ClaimsSet) -> Result<(), JoseError> {
        match claims.expiration_time() {
            Some(_) => Ok(()),
            None => Err(JoseError::ClaimsError),
        }
    }
}

pub struct ForSubject<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for ForSubject<T> {
    type Claims = ClaimsSet;

    fn validate(&self, claims: &ClaimsSet) -> Result<(), JoseError> {
        if claims.subject() != Some(self.0.as_ref()) {
            return Err(JoseError::ClaimsError);
        }
        Ok(())
    }
}

pub struct FromIssuer<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for FromIssuer<T> {
    type Claims = ClaimsSet;

    fn validate(&self, claims: &ClaimsSet) -> Result<(), JoseError> {
        if claims.issuer() != Some(self.0.as_ref()) {
            return Err(JoseError::ClaimsError);
        }
        Ok(())
    }
}

/// Requires the given audience to be one of the token's audiences.
pub struct ForAudience<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> Validate for ForAudience<T> {
    type Claims = ClaimsSet;

    fn validate(&self, claims: &ClaimsSet) -> Result<(), JoseError> {
        let audience = claims.audience().unwrap_or_default();
        if !audience.contains(&self.0.as_ref()) {
            return Err(JoseError::ClaimsError);
        }
        Ok(())
    }
}
