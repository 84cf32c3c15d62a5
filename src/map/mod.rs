//! Keyed-collection machinery: the immutable container seam, the read-side
//! accumulator, and the write-side suspend/resume engine.
//!
//! A container participates by implementing [`ImmutableMap`] (read-only
//! iteration) and registering a construction entry point with the registry
//! (building). The codec never mutates a container entry-by-entry: reads
//! accumulate into private staging and convert once, writes borrow the
//! container for the duration of serialization.

/// Read-side accumulation into an immutable result.
pub mod accumulate;
/// Write-side suspend/resume engine.
pub mod write;

pub use accumulate::MapAccumulator;
pub use write::{MapSerializer, MapValueCodec, WriteCursor, WriteOutcome};

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use crate::codec::{KeyCodec, ValueCodec};
use crate::error::Result;
use crate::registry::{CodecRegistry, ConstructionStrategy, LazySlot};

/// A read-only keyed container whose entries were fixed at construction.
///
/// Implementations must iterate in a stable order for a given instance:
/// [`entries`](Self::entries) called twice on the same unmodified value
/// yields the same sequence. Suspended writes rely on this to resume at an
/// entry index.
pub trait ImmutableMap: Sized + 'static {
    /// The key type. Keys are total values (no missing-key sentinel) and
    /// must support equality and hashing for staging.
    type Key: Eq + Hash + 'static;
    /// The element (value) type.
    type Value: 'static;

    /// Number of entries.
    fn len(&self) -> usize;

    /// True when the container has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The entries in the container's natural iteration order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&Self::Key, &Self::Value)> + '_>;
}

/// The per-type metadata record for a registered container type.
///
/// One record exists per registered `C` and lives as long as its registry
/// entry. It memoizes everything resolved on behalf of `C`: the key codec,
/// the value codec, and the construction strategy, so repeated operations
/// (and repeated resume calls within one operation) never re-resolve.
pub struct ImmutableMapCodec<C: ImmutableMap> {
    key_codec: LazySlot<Arc<dyn KeyCodec<C::Key>>>,
    value_codec: LazySlot<Arc<dyn ValueCodec<C::Value>>>,
    strategy: LazySlot<ConstructionStrategy<C>>,
}

impl<C: ImmutableMap> std::fmt::Debug for ImmutableMapCodec<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImmutableMapCodec")
            .field("key_codec", &self.key_codec)
            .field("value_codec", &self.value_codec)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl<C: ImmutableMap> ImmutableMapCodec<C> {
    /// Creates an unresolved record.
    pub fn new() -> Self {
        Self {
            key_codec: LazySlot::new(),
            value_codec: LazySlot::new(),
            strategy: LazySlot::new(),
        }
    }

    /// Containers produced by this codec carry no identity: equal-content
    /// instances are indistinguishable, so no identity/reference marker is
    /// ever emitted or expected for them, even when a host tracks identity
    /// for mutable reference types elsewhere.
    pub fn tracks_identity(&self) -> bool {
        false
    }

    /// The key codec for `C::Key`, resolved once and memoized.
    pub(crate) fn key_codec(&self, registry: &CodecRegistry) -> Result<Arc<dyn KeyCodec<C::Key>>> {
        self.key_codec
            .get_or_try_insert(|| registry.key_codec::<C::Key>())
    }

    /// The value codec for `C::Value`, resolved once and memoized.
    pub(crate) fn value_codec(
        &self,
        registry: &CodecRegistry,
    ) -> Result<Arc<dyn ValueCodec<C::Value>>> {
        self.value_codec
            .get_or_try_insert(|| registry.value_codec::<C::Value>())
    }

    /// The construction strategy for `C`, discovered once through the
    /// registry and memoized for the record's lifetime.
    pub(crate) fn strategy(&self, registry: &CodecRegistry) -> Result<ConstructionStrategy<C>> {
        self.strategy
            .get_or_try_insert(|| registry.discover_builder::<C>())
    }
}

impl<C: ImmutableMap> Default for ImmutableMapCodec<C> {
    fn default() -> Self {
        Self::new()
    }
}

// --- FOREIGN CONTAINER IMPLS ---
//
// An `Arc` around a standard map is immutable in the sense that matters
// here: no entry can be added or removed through the shared handle.

impl<K, V> ImmutableMap for Arc<HashMap<K, V>>
where
    K: Eq + Hash + 'static,
    V: 'static,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

impl<K, V> ImmutableMap for Arc<BTreeMap<K, V>>
where
    K: Ord + Eq + Hash + 'static,
    V: 'static,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}
