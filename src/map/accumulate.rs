//! The read-path accumulation engine.
//!
//! An immutable container cannot be grown entry-by-entry, so incremental
//! reading stages entries in a private mutable map and converts exactly once
//! at the end, through the construction strategy cached on the container's
//! metadata record. The staging map never crosses the accumulator boundary;
//! only the finished immutable container does.

use std::collections::HashMap;

use crate::error::{RescodeError, Result};
use crate::map::{ImmutableMap, ImmutableMapCodec};
use crate::registry::CodecRegistry;

/// Lifecycle of one read operation's staging context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No collection has been opened yet.
    Idle,
    /// Entries are being staged.
    Open,
    /// The staging map was converted; this accumulator is spent.
    Finalized,
}

/// The accumulation state machine for one in-flight collection read.
///
/// Drive it with [`begin`](Self::begin), any number of
/// [`add_entry`](Self::add_entry) calls, then one
/// [`finalize`](Self::finalize). An accumulator serves exactly one
/// collection; protocol violations are reported rather than absorbed.
pub struct MapAccumulator<C: ImmutableMap> {
    staging: Option<HashMap<C::Key, C::Value>>,
    phase: Phase,
}

impl<C: ImmutableMap> std::fmt::Debug for MapAccumulator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapAccumulator")
            .field("phase", &self.phase)
            .field("staged", &self.staged_len())
            .finish()
    }
}

impl<C: ImmutableMap> MapAccumulator<C> {
    /// Creates an idle accumulator.
    pub fn new() -> Self {
        Self {
            staging: None,
            phase: Phase::Idle,
        }
    }

    /// Opens the staging context for a fresh collection.
    ///
    /// # Errors
    ///
    /// [`RescodeError::Protocol`] if a staging context is already open, and
    /// [`RescodeError::InvalidState`] if this accumulator was already
    /// finalized.
    pub fn begin(&mut self) -> Result<()> {
        match self.phase {
            Phase::Idle => {
                self.staging = Some(HashMap::new());
                self.phase = Phase::Open;
                Ok(())
            }
            Phase::Open => Err(RescodeError::Protocol(
                "collection staging context is already open".into(),
            )),
            Phase::Finalized => Err(RescodeError::InvalidState(
                "accumulator was already finalized".into(),
            )),
        }
    }

    /// Stages one entry. A later entry with an equal key overwrites the
    /// earlier one (last key wins).
    ///
    /// # Errors
    ///
    /// [`RescodeError::InvalidState`] if no staging context is open.
    pub fn add_entry(&mut self, key: C::Key, value: C::Value) -> Result<()> {
        match self.staging.as_mut() {
            Some(staging) => {
                staging.insert(key, value);
                Ok(())
            }
            None => Err(RescodeError::InvalidState(
                "add_entry without an open staging context".into(),
            )),
        }
    }

    /// Number of entries currently staged.
    pub fn staged_len(&self) -> usize {
        self.staging.as_ref().map_or(0, HashMap::len)
    }

    /// Converts the staged entries into the immutable container, exactly
    /// once.
    ///
    /// The construction strategy is looked up (or discovered and cached) on
    /// `record`, then invoked with the complete entry sequence. The staging
    /// map is consumed either way; on error no partially-built container
    /// remains reachable.
    ///
    /// # Errors
    ///
    /// [`RescodeError::InvalidState`] on a second finalize or a finalize
    /// without [`begin`](Self::begin);
    /// [`RescodeError::UnsupportedType`] when `C` has no construction entry
    /// point.
    pub fn finalize(
        &mut self,
        registry: &CodecRegistry,
        record: &ImmutableMapCodec<C>,
    ) -> Result<C> {
        let staging = self.staging.take().ok_or_else(|| {
            RescodeError::InvalidState(match self.phase {
                Phase::Finalized => "accumulator was already finalized".into(),
                _ => "finalize without an open staging context".into(),
            })
        })?;
        self.phase = Phase::Finalized;

        let strategy = record.strategy(registry)?;
        Ok(strategy(staging.into_iter().collect()))
    }
}

impl<C: ImmutableMap> Default for MapAccumulator<C> {
    fn default() -> Self {
        Self::new()
    }
}
