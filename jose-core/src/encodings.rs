//! Compact serialization primitives.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::JoseError;

/// Unpadded base64url, as used for every compact segment.
pub fn encode(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

/// Strict unpadded base64url decoding.
pub fn decode(segment: &str) -> Result<Vec<u8>, JoseError> {
    Base64UrlUnpadded::decode_vec(segment).map_err(|_| JoseError::Base64DecodeError)
}

/// Split a compact token into exactly `N` dot separated segments.
pub fn split_segments<const N: usize>(token: &str) -> Result<[&str; N], JoseError> {
    let mut segments = [""; N];
    let mut parts = token.split('.');
    for segment in &mut segments {
        *segment = parts.next().ok_or(JoseError::InvalidToken)?;
    }
    if parts.next().is_some() {
        return Err(JoseError::InvalidToken);
    }
    Ok(segments)
}

/// The number of dot separated segments in a compact token.
pub fn segment_count(token: &str) -> usize {
    token.bytes().filter(|&b| b == b'.').count() + 1
}

/// Payload encoding for a signed or encrypted token.
pub trait Payload: Sized {
    /// Value of the `cty` header parameter announcing this payload, if any.
    const CONTENT_TYPE: Option<&'static str>;

    fn encode(&self) -> Result<Vec<u8>, JoseError>;

    fn decode(payload: &[u8]) -> Result<Self, JoseError>;
}
