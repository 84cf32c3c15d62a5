//! The type registry: codec dispatch and construction-strategy discovery.
//!
//! The registry is the process-wide table consulted whenever the collection
//! machinery needs behavior for a declared type: the key codec, the value
//! codec, or the construction entry point that builds a concrete immutable
//! container from staged entries. Lookups are keyed by [`TypeId`]; a type
//! with no registration fails with [`RescodeError::UnsupportedType`] at
//! first resolution, never at registration time.
//!
//! Resolution results are memoized per container type on its metadata record
//! (see [`ImmutableMapCodec`](crate::map::ImmutableMapCodec)) through
//! [`LazySlot`], so the discovery tables are consulted once per type for the
//! registry's lifetime. Concurrent first resolutions may race; the race is
//! benign: both compute an equivalent result, the first store wins, and a
//! reader never observes a partial value.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::codec::{KeyCodec, ScalarCodec, ValueCodec};
use crate::error::{RescodeError, Result};
use crate::map::{ImmutableMap, ImmutableMapCodec, MapValueCodec};

/// A cached factory building one concrete immutable container type from a
/// sequence of staged key/value pairs.
///
/// Strategies must be pure with respect to their input sequence: the same
/// sequence always produces an equivalent container.
pub type ConstructionStrategy<C> = Arc<
    dyn Fn(Vec<(<C as ImmutableMap>::Key, <C as ImmutableMap>::Value)>) -> C + Send + Sync,
>;

type AnyEntry = Arc<dyn Any + Send + Sync>;
type AnyTable = RwLock<HashMap<TypeId, AnyEntry>>;

fn poisoned(what: &str) -> RescodeError {
    RescodeError::InvalidState(format!("{what} lock poisoned"))
}

/// A lookup-or-insert cache for one lazily resolved value.
///
/// The initializer runs outside the lock, so two threads missing at the same
/// time may both compute; the first store wins and the loser's result is
/// discarded. A stored value is always complete before it becomes visible.
pub struct LazySlot<T: Clone> {
    inner: RwLock<Option<T>>,
}

impl<T: Clone> std::fmt::Debug for LazySlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner.read() {
            Ok(guard) if guard.is_some() => "resolved",
            Ok(_) => "unresolved",
            Err(_) => "poisoned",
        };
        write!(f, "LazySlot({state})")
    }
}

impl<T: Clone> Default for LazySlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> LazySlot<T> {
    /// An empty slot.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Returns the cached value, resolving it through `init` on first use.
    pub fn get_or_try_insert(&self, init: impl FnOnce() -> Result<T>) -> Result<T> {
        {
            let guard = self.inner.read().map_err(|_| poisoned("cache slot"))?;
            if let Some(value) = guard.as_ref() {
                return Ok(value.clone());
            }
        }

        let value = init()?;

        let mut guard = self.inner.write().map_err(|_| poisoned("cache slot"))?;
        match guard.as_ref() {
            // Another operation resolved first; keep its result.
            Some(existing) => Ok(existing.clone()),
            None => {
                *guard = Some(value.clone());
                Ok(value)
            }
        }
    }
}

/// The central dispatch table mapping declared types to their codecs, map
/// metadata records, and construction entry points.
///
/// A registry is cheap to share behind `&` across threads; every table
/// tolerates concurrent readers and writers. Re-registering a type replaces
/// the previous entry (last wins), but records already resolved by in-flight
/// operations keep whatever they cached.
#[derive(Default)]
pub struct CodecRegistry {
    key_codecs: AnyTable,
    value_codecs: AnyTable,
    builders: AnyTable,
    map_records: AnyTable,
    strategy_probes: AtomicU64,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = |table: &AnyTable| table.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("CodecRegistry")
            .field("key_codecs", &count(&self.key_codecs))
            .field("value_codecs", &count(&self.value_codecs))
            .field("builders", &count(&self.builders))
            .field("map_records", &count(&self.map_records))
            .field("strategy_probes", &self.strategy_probes.load(Ordering::Relaxed))
            .finish()
    }
}

impl CodecRegistry {
    /// Creates an empty registry. Most callers want
    /// [`with_defaults`](Self::with_defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the scalar codecs pre-registered: `String`
    /// and `bool` plus all integer widths as keys and values, and `f32`/
    /// `f64` as values.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let scalar = Arc::new(ScalarCodec);

        macro_rules! register_scalar_entry {
            (keys: $($k:ty),*) => {
                $(registry.register_key_codec::<$k>(scalar.clone());)*
            };
            (values: $($v:ty),*) => {
                $(registry.register_value_codec::<$v>(scalar.clone());)*
            };
        }

        register_scalar_entry!(keys: String, bool, u8, u16, u32, u64, i8, i16, i32, i64);
        register_scalar_entry!(values: String, bool, u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

        registry
    }

    // --- REGISTRATION ---

    /// Registers the key codec for key type `K`.
    pub fn register_key_codec<K: 'static>(&self, codec: Arc<dyn KeyCodec<K>>) {
        Self::insert(&self.key_codecs, TypeId::of::<K>(), Arc::new(codec));
    }

    /// Registers the value codec for value type `T`.
    pub fn register_value_codec<T: 'static>(&self, codec: Arc<dyn ValueCodec<T>>) {
        Self::insert(&self.value_codecs, TypeId::of::<T>(), Arc::new(codec));
    }

    /// Registers container type `C`: installs its metadata record and its
    /// value codec, so `C` can appear both as a document root and nested as
    /// a value inside another collection.
    ///
    /// Reading into `C` additionally needs a construction entry point; see
    /// [`register_builder`](Self::register_builder).
    pub fn register_map<C: ImmutableMap>(&self) {
        let record = Arc::new(ImmutableMapCodec::<C>::new());
        Self::insert(
            &self.map_records,
            TypeId::of::<C>(),
            Arc::new(record.clone()),
        );
        self.register_value_codec::<C>(Arc::new(MapValueCodec::new(record)));
        debug!("registered map container `{}`", type_name::<C>());
    }

    /// Registers the construction entry point for container type `C`: the
    /// function that builds a `C` from a complete sequence of staged
    /// entries.
    pub fn register_builder<C, F>(&self, build: F)
    where
        C: ImmutableMap,
        F: Fn(Vec<(C::Key, C::Value)>) -> C + Send + Sync + 'static,
    {
        let strategy: ConstructionStrategy<C> = Arc::new(build);
        Self::insert(&self.builders, TypeId::of::<C>(), Arc::new(strategy));
        debug!(
            "registered construction entry point for `{}`",
            type_name::<C>()
        );
    }

    // --- RESOLUTION ---

    /// Resolves the key codec for key type `K`.
    ///
    /// # Errors
    ///
    /// [`RescodeError::UnsupportedType`] when no codec is registered.
    pub fn key_codec<K: 'static>(&self) -> Result<Arc<dyn KeyCodec<K>>> {
        Self::fetch::<Arc<dyn KeyCodec<K>>>(&self.key_codecs, TypeId::of::<K>())?.ok_or_else(
            || {
                RescodeError::UnsupportedType(format!(
                    "no key codec registered for `{}`",
                    type_name::<K>()
                ))
            },
        )
    }

    /// Resolves the value codec for value type `T`.
    ///
    /// # Errors
    ///
    /// [`RescodeError::UnsupportedType`] when no codec is registered.
    pub fn value_codec<T: 'static>(&self) -> Result<Arc<dyn ValueCodec<T>>> {
        Self::fetch::<Arc<dyn ValueCodec<T>>>(&self.value_codecs, TypeId::of::<T>())?.ok_or_else(
            || {
                RescodeError::UnsupportedType(format!(
                    "no value codec registered for `{}`",
                    type_name::<T>()
                ))
            },
        )
    }

    /// Resolves the metadata record for container type `C`.
    ///
    /// # Errors
    ///
    /// [`RescodeError::UnsupportedType`] when `C` was never registered with
    /// [`register_map`](Self::register_map).
    pub fn map_record<C: ImmutableMap>(&self) -> Result<Arc<ImmutableMapCodec<C>>> {
        Self::fetch::<Arc<ImmutableMapCodec<C>>>(&self.map_records, TypeId::of::<C>())?.ok_or_else(
            || {
                RescodeError::UnsupportedType(format!(
                    "container type `{}` is not registered",
                    type_name::<C>()
                ))
            },
        )
    }

    /// The discovery mechanism behind the construction-strategy cache:
    /// consults the builder table for `C`.
    ///
    /// Called once per container type per registry lifetime: the result is
    /// memoized on the type's metadata record, and
    /// [`strategy_probes`](Self::strategy_probes) counts the consultations
    /// so the memoization is observable.
    ///
    /// # Errors
    ///
    /// [`RescodeError::UnsupportedType`] when no entry point was registered;
    /// terminal for the read operation that triggered discovery.
    pub(crate) fn discover_builder<C: ImmutableMap>(&self) -> Result<ConstructionStrategy<C>> {
        let probe = self.strategy_probes.fetch_add(1, Ordering::Relaxed) + 1;
        let found =
            Self::fetch::<ConstructionStrategy<C>>(&self.builders, TypeId::of::<C>())?;
        match found {
            Some(strategy) => {
                debug!(
                    "resolved construction strategy for `{}` (probe #{probe})",
                    type_name::<C>()
                );
                Ok(strategy)
            }
            None => Err(RescodeError::UnsupportedType(format!(
                "no construction entry point registered for `{}`",
                type_name::<C>()
            ))),
        }
    }

    /// How many times strategy discovery has consulted the builder table.
    ///
    /// Memoization keeps this at one consultation per container type (racing
    /// first resolutions may add a benign extra).
    pub fn strategy_probes(&self) -> u64 {
        self.strategy_probes.load(Ordering::Relaxed)
    }

    // --- TABLE PLUMBING ---

    fn insert(table: &AnyTable, id: TypeId, entry: AnyEntry) {
        // Registration proceeds even through a poisoned lock; the tables
        // hold no invariants beyond the map itself.
        let mut guard = table.write().unwrap_or_else(|p| p.into_inner());
        guard.insert(id, entry);
    }

    fn fetch<T: Clone + 'static>(table: &AnyTable, id: TypeId) -> Result<Option<T>> {
        let guard = table.read().map_err(|_| poisoned("registry table"))?;
        Ok(guard.get(&id).and_then(|e| e.downcast_ref::<T>()).cloned())
    }
}
