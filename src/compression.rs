//! Pluggable document compression.
//!
//! Persisted documents may compress the wire payload as a whole; the
//! algorithm id is recorded in the document header so readers can select the
//! matching decompressor. Id 0 is reserved for no compression.

use std::borrow::Cow;

use crate::error::{RescodeError, Result};

/// Interface for document compression algorithms.
///
/// Each compressor is identified by a unique id stored in the document
/// header.
pub trait Compressor: Send + Sync + std::fmt::Debug {
    /// The unique id recorded in the document header. 0 is reserved for
    /// no compression.
    fn id(&self) -> u8;

    /// Compresses the payload.
    ///
    /// May borrow the input when no transformation is performed.
    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>>;

    /// Decompresses the payload.
    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>>;
}

/// A compressor that performs no compression (pass-through, id 0).
#[derive(Debug, Clone, Copy)]
pub struct NoCompression;

impl Compressor for NoCompression {
    fn id(&self) -> u8 {
        0
    }

    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(data))
    }

    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(data))
    }
}

/// A compressor using the LZ4 algorithm (id 1).
///
/// Available when the `lz4_flex` feature is enabled.
#[cfg(feature = "lz4_flex")]
#[derive(Debug, Clone, Copy)]
pub struct Lz4Compressor;

#[cfg(feature = "lz4_flex")]
impl Compressor for Lz4Compressor {
    fn id(&self) -> u8 {
        1
    }

    fn compress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Owned(lz4_flex::compress_prepend_size(data)))
    }

    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let raw = lz4_flex::decompress_size_prepended(data)
            .map_err(|e| RescodeError::Compression(e.to_string()))?;
        Ok(Cow::Owned(raw))
    }
}

/// Decompresses a payload by the algorithm id found in a document header.
pub(crate) fn decompress_by_id(id: u8, data: &[u8]) -> Result<Cow<'_, [u8]>> {
    match id {
        0 => NoCompression.decompress(data),
        #[cfg(feature = "lz4_flex")]
        1 => Lz4Compressor.decompress(data),
        _ => Err(RescodeError::Compression(format!(
            "unknown compression id: {id}"
        ))),
    }
}
