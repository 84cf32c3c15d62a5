//! # Rescode
//!
//! A resumable codec between a textual key/value wire representation and
//! immutable keyed containers, built for two hard constraints:
//!
//! 1. **Finite output buffers.** Writing can pause after any completed
//!    sub-step when the output buffer signals back-pressure, and resume
//!    later without re-processing already-emitted entries.
//! 2. **Immutable targets.** The produced container cannot be mutated
//!    entry-by-entry, so reading accumulates into private staging and
//!    converts exactly once, through a per-type construction strategy that
//!    is discovered lazily and cached for the life of the registry.
//!
//! ## Key Features
//!
//! *   **Cooperative Suspension:** The write path is an explicit state
//!     machine (an entry index plus a key-written marker), not a coroutine.
//!     Callers hold the cursor between resume calls, so a write can be
//!     spread across any number of buffer drains and the output is
//!     byte-identical to an uninterrupted write.
//! *   **Nested Back-Pressure:** Collections nest as values. A nested
//!     collection suspends and resumes through the same machinery, its state
//!     riding opaquely inside the outer cursor.
//! *   **Pluggable Containers:** Any type implementing [`ImmutableMap`] can
//!     be read and written once registered; construction goes through a
//!     registered entry point, so container types stay free of codec
//!     concerns. [`FrozenMap`] ships as the reference container.
//! *   **Memoized Type Metadata:** Element codecs and construction
//!     strategies resolve once per container type and are reused by every
//!     subsequent operation, including across threads.
//! *   **Persisted Documents:** Memory-mapped reads, buffered sequential
//!     writes, and optional LZ4 compression (feature: `lz4_flex`) behind a
//!     six-byte header.
//!
//! ## Usage Patterns
//!
//! ### Whole-Document Round Trip
//!
//! ```rust
//! use rescode::{CodecRegistry, FrozenMap, Rescode};
//!
//! let registry = CodecRegistry::with_defaults();
//! registry.register_map::<FrozenMap<String, i64>>();
//! registry.register_builder::<FrozenMap<String, i64>, _>(FrozenMap::from_entries);
//!
//! let scores = FrozenMap::from_entries(vec![
//!     ("alice".to_owned(), 9_i64),
//!     ("bob".to_owned(), 7_i64),
//! ]);
//!
//! let text = Rescode::to_string(&registry, &scores)?;
//! let back: FrozenMap<String, i64> = Rescode::from_str(&registry, &text)?;
//! assert_eq!(back, scores);
//! # Ok::<(), rescode::RescodeError>(())
//! ```
//!
//! ### Suspendable Writing
//!
//! ```rust
//! use rescode::{CodecRegistry, FrozenMap, MapSerializer, TokenWriter, WriteStatus};
//!
//! # let registry = CodecRegistry::with_defaults();
//! # registry.register_map::<FrozenMap<String, i64>>();
//! # let big_map = FrozenMap::from_entries(
//! #     (0..100_i64).map(|i| (format!("k{i}"), i)).collect::<Vec<_>>(),
//! # );
//! let mut serializer = MapSerializer::new(&registry, &big_map)?;
//! let mut writer = TokenWriter::with_threshold(64);
//! let mut document = Vec::new();
//! loop {
//!     let status = serializer.resume(&mut writer)?;
//!     writer.drain_to(&mut document)?; // ship a filled buffer downstream
//!     if status == WriteStatus::Done {
//!         break;
//!     }
//! }
//! # Ok::<(), rescode::RescodeError>(())
//! ```
//!
//! ## Safety and Error Handling
//!
//! * **Encapsulated Unsafe:** `unsafe` appears only for the memory-mapped
//!   file view in the `io` module.
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library
//!   (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to a
//!   [`RescodeError`] variant and abort the operation that raised them; no
//!   partial container is ever returned.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod codec;
pub mod compression;
pub mod emit;
pub mod error;
pub mod frozen;
pub mod inspector;
pub mod map;
pub mod registry;
pub mod wire;

// --- INTERNAL IMPLEMENTATION MODULES (Hidden from Docs) ---
#[doc(hidden)]
pub mod io;

// --- RE-EXPORTS ---

pub use api::Rescode;
pub use codec::{KeyCodec, ResumeSlot, ScalarCodec, ValueCodec, WriteStatus};
#[cfg(feature = "lz4_flex")]
pub use compression::Lz4Compressor;
pub use compression::{Compressor, NoCompression};
pub use emit::TokenWriter;
pub use error::{RescodeError, Result};
pub use frozen::FrozenMap;
pub use inspector::{WireInspector, WireReport};
pub use map::{
    ImmutableMap, ImmutableMapCodec, MapAccumulator, MapSerializer, WriteCursor, WriteOutcome,
};
pub use registry::{CodecRegistry, ConstructionStrategy, LazySlot};
pub use wire::{Token, TokenReader};

/// Constants used throughout the library.
pub mod constants {
    /// Default buffered bytes before the writer requests a pause.
    pub const DEFAULT_FLUSH_THRESHOLD: usize = 8 * 1024;

    /// Maximum collection nesting accepted by the tokenizer.
    pub const MAX_NESTING_DEPTH: usize = 128;
}
