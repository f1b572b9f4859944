use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::JoseError;
use crate::algorithm::CompressionAlgorithm;

/// Upper bound on an inflated payload.
pub(crate) const MAX_INFLATED_LEN: u64 = 1 << 20;

pub(crate) fn compress(zip: Option<CompressionAlgorithm>, data: Vec<u8>) -> Result<Vec<u8>, JoseError> {
    match zip {
        None => Ok(data),
        Some(CompressionAlgorithm::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            Ok(encoder.finish()?)
        }
    }
}

pub(crate) fn decompress(zip: Option<CompressionAlgorithm>, data: Vec<u8>) -> Result<Vec<u8>, JoseError> {
    match zip {
        None => Ok(data),
        Some(CompressionAlgorithm::Deflate) => {
            let mut out = Vec::new();
            DeflateDecoder::new(&data[..])
                .take(MAX_INFLATED_LEN + 1)
                .read_to_end(&mut out)?;
            if out.len() as u64 > MAX_INFLATED_LEN {
                return Err(JoseError::InvalidToken);
            }
            Ok(out)
        }
    }
}
