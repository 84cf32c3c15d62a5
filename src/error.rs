//! Centralized error handling for Rescode.
//!
//! All failure conditions are propagated through the `Result` type; the
//! library enforces this with `#![deny(clippy::panic)]` and
//! `#![deny(clippy::unwrap_used)]`.
//!
//! ## Error Categories
//!
//! Errors are categorized by their domain:
//!
//! - **Protocol Errors** ([`RescodeError::Protocol`]): malformed wire input
//!   or API calls that violate the collection protocol
//! - **Unsupported Type Errors** ([`RescodeError::UnsupportedType`]): no
//!   codec or construction entry point registered for a declared type
//! - **Invalid State Errors** ([`RescodeError::InvalidState`]): API misuse,
//!   e.g. a double finalize or resuming a completed write
//! - **Codec Errors** ([`RescodeError::Codec`]): an element codec rejected a
//!   value (type mismatch, out-of-range lexical form)
//! - **Compression Errors** ([`RescodeError::Compression`]): document
//!   compression/decompression failures
//! - **I/O Errors** ([`RescodeError::Io`]): low-level file system operations
//!
//! All errors are fatal to the operation that raised them; nothing is
//! retried internally and no partial container is ever returned.
//!
//! ## Error Propagation with `?`
//!
//! ```rust
//! use rescode::{CodecRegistry, FrozenMap, Rescode};
//!
//! fn parse_counts(registry: &CodecRegistry, text: &str) -> rescode::Result<FrozenMap<String, i64>> {
//!     let counts = Rescode::from_str(registry, text)?;
//!     Ok(counts)
//! }
//! # let registry = CodecRegistry::with_defaults();
//! # registry.register_map::<FrozenMap<String, i64>>();
//! # registry.register_builder::<FrozenMap<String, i64>, _>(FrozenMap::from_entries);
//! # assert_eq!(parse_counts(&registry, "{\"a\": 1}")?.len(), 1);
//! # Ok::<(), rescode::RescodeError>(())
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for Rescode operations.
///
/// Equivalent to `std::result::Result<T, RescodeError>`.
pub type Result<T> = std::result::Result<T, RescodeError>;

/// The master error enum covering all failure domains in Rescode.
///
/// This type is `Clone` to support error sharing across threads and storage
/// for later analysis. I/O errors are wrapped in `Arc` to make cloning cheap.
#[derive(Debug, Clone)]
pub enum RescodeError {
    /// The wire input violates the collection grammar, or a caller violated
    /// the read-side protocol (e.g. opening a collection that is already
    /// open).
    ///
    /// ## Common Causes
    ///
    /// - A value with no preceding key
    /// - Missing `:` after a key, or an unquoted key
    /// - Trailing data after the document
    /// - A collection left unterminated at end of input
    Protocol(String),

    /// No codec or construction entry point is registered for the requested
    /// type.
    ///
    /// Raised at first resolution, not at registration time, and terminal
    /// for the operation that triggered it.
    UnsupportedType(String),

    /// API misuse detected defensively (double finalize, resume after a
    /// completed write, foreign resume state, poisoned internal lock).
    InvalidState(String),

    /// An element codec rejected a value: a token of the wrong kind for the
    /// declared type, or a lexical form that does not parse into it.
    ///
    /// Codec failures pass through the collection machinery untranslated.
    Codec(String),

    /// Document compression or decompression failure, including an
    /// unrecognized compression id in a document header.
    Compression(String),

    /// Low-level I/O failure (disk full, permissions, truncated file, etc.).
    ///
    /// The underlying `io::Error` is wrapped in an `Arc` to keep the error
    /// `Clone`.
    Io(Arc<io::Error>),
}

impl fmt::Display for RescodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(s) => write!(f, "Protocol Error: {s}"),
            Self::UnsupportedType(s) => write!(f, "Unsupported Type: {s}"),
            Self::InvalidState(s) => write!(f, "Invalid State: {s}"),
            Self::Codec(s) => write!(f, "Codec Error: {s}"),
            Self::Compression(s) => write!(f, "Compression Error: {s}"),
            Self::Io(e) => write!(f, "I/O Error: {e}"),
        }
    }
}

impl std::error::Error for RescodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RescodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
