//! The write-path suspend/resume engine.
//!
//! Writing a keyed collection must be able to pause mid-collection when the
//! output buffer asks for a flush, and continue later without re-emitting
//! anything. Suspension is purely cooperative, with no coroutines and no
//! threads: an explicit [`WriteCursor`] captures the enumeration position
//! plus which half of the in-flight pair is already written, and the caller
//! hands it back on the next resume call.
//!
//! Suspension points are fixed: the back-pressure check at the top of every
//! entry iteration, and a nested value codec suspending mid-value (its
//! private state rides along in the cursor, opaque to this engine).

use std::sync::Arc;

use log::trace;

use crate::codec::{ResumeSlot, ValueCodec, WriteStatus};
use crate::emit::TokenWriter;
use crate::error::{RescodeError, Result};
use crate::map::{ImmutableMap, ImmutableMapCodec, MapAccumulator};
use crate::registry::CodecRegistry;
use crate::wire::{Token, TokenReader};

/// Where a suspended collection write left off.
///
/// The cursor uniquely determines the resumption point: the index of the
/// in-flight entry, whether its key is already on the wire, and any nested
/// codec state for a value suspended mid-write. It exists only between the
/// suspend and the resume; a finished write discards it.
#[derive(Debug, Default)]
pub struct WriteCursor {
    entry_index: usize,
    key_written: bool,
    nested: ResumeSlot,
}

impl WriteCursor {
    fn start() -> Self {
        Self::default()
    }

    /// Index of the entry the write will continue with.
    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    /// True when the in-flight entry's key is already written, so resumption
    /// continues with its value.
    pub fn key_written(&self) -> bool {
        self.key_written
    }
}

/// Result of one resume call over a collection's entries.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Every entry is written.
    Done,
    /// The write paused; pass the cursor back to continue.
    Suspended(WriteCursor),
}

impl<C: ImmutableMap> ImmutableMapCodec<C> {
    /// Writes `container`'s entries starting from `cursor`, pausing under
    /// back-pressure.
    ///
    /// With no cursor this is a fresh write: an empty container completes
    /// immediately with zero output. Entries are emitted in the container's
    /// natural iteration order, each as quoted key, value, entry close; the
    /// engine buffers nothing beyond the single in-flight entry.
    ///
    /// Collection delimiters are the enclosing codec's concern (see
    /// [`MapValueCodec`]); this loop emits entries only.
    ///
    /// # Errors
    ///
    /// Element codec failures propagate untranslated; the cursor is
    /// discarded and the write cannot be resumed.
    pub fn resume_entries(
        &self,
        registry: &CodecRegistry,
        container: &C,
        out: &mut TokenWriter,
        cursor: Option<WriteCursor>,
    ) -> Result<WriteOutcome> {
        // 1. First call: fresh enumeration; nothing to do for an empty
        //    container.
        let mut cursor = match cursor {
            Some(cursor) => cursor,
            None => {
                if container.is_empty() {
                    return Ok(WriteOutcome::Done);
                }
                WriteCursor::start()
            }
        };

        // 2. Element codecs resolve once per record; repeated resume calls
        //    hit the memoized references.
        let key_codec = self.key_codec(registry)?;
        let value_codec = self.value_codec(registry)?;

        // 3. Iterate from the cursor position. The container's stable
        //    iteration order makes index-based resumption exact.
        for (key, value) in container.entries().skip(cursor.entry_index) {
            // 3a. Back-pressure gate, checked before this entry's pending
            //     tokens. Nothing partial is on the wire for this entry
            //     beyond what the cursor already records.
            if out.should_pause() {
                trace!(
                    "collection write paused at entry {} (key_written: {})",
                    cursor.entry_index, cursor.key_written
                );
                return Ok(WriteOutcome::Suspended(cursor));
            }

            // 3b. Key half. Keys render in quoted lexical form whatever
            //     their native type.
            if !cursor.key_written {
                out.key(&key_codec.lexical(key));
                cursor.key_written = true;
            }

            // 3c. Value half. A suspendable codec stashes its own state in
            //     the cursor's nested slot; the enumerator does not move.
            if value_codec.write(registry, value, out, &mut cursor.nested)?
                == WriteStatus::Suspended
            {
                trace!(
                    "collection write paused inside value of entry {}",
                    cursor.entry_index
                );
                return Ok(WriteOutcome::Suspended(cursor));
            }

            // 3d. Entry close; advance the enumerator.
            out.end_entry();
            cursor.key_written = false;
            cursor.entry_index += 1;
        }

        // 4. Enumerator exhausted.
        Ok(WriteOutcome::Done)
    }
}

/// Resume state for a collection appearing in value position.
#[derive(Debug, Default)]
struct NestedFrame {
    opened: bool,
    cursor: Option<WriteCursor>,
}

/// The value codec for a registered container type.
///
/// Handles the collection delimiters and delegates entry iteration to the
/// type's metadata record, which makes top-level and nested collections the
/// same code path. On the read side it drives a [`MapAccumulator`] to a
/// finished immutable container.
pub struct MapValueCodec<C: ImmutableMap> {
    record: Arc<ImmutableMapCodec<C>>,
}

impl<C: ImmutableMap> MapValueCodec<C> {
    /// Wraps a metadata record.
    pub fn new(record: Arc<ImmutableMapCodec<C>>) -> Self {
        Self { record }
    }
}

impl<C: ImmutableMap> std::fmt::Debug for MapValueCodec<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapValueCodec")
            .field("record", &self.record)
            .finish()
    }
}

impl<C: ImmutableMap> ValueCodec<C> for MapValueCodec<C> {
    fn write(
        &self,
        registry: &CodecRegistry,
        value: &C,
        out: &mut TokenWriter,
        resume: &mut ResumeSlot,
    ) -> Result<WriteStatus> {
        let mut frame = resume.take::<NestedFrame>()?.unwrap_or_default();

        if !frame.opened {
            out.begin_map();
            frame.opened = true;
        }

        match self
            .record
            .resume_entries(registry, value, out, frame.cursor.take())?
        {
            WriteOutcome::Suspended(cursor) => {
                frame.cursor = Some(cursor);
                resume.store(frame);
                Ok(WriteStatus::Suspended)
            }
            WriteOutcome::Done => {
                out.end_map();
                Ok(WriteStatus::Done)
            }
        }
    }

    fn read(&self, registry: &CodecRegistry, tokens: &mut TokenReader<'_>) -> Result<C> {
        match tokens.expect_next()? {
            Token::BeginMap => {}
            other => {
                return Err(RescodeError::Codec(format!(
                    "expected a collection, found {}",
                    other.kind()
                )));
            }
        }

        let key_codec = self.record.key_codec(registry)?;
        let value_codec = self.record.value_codec(registry)?;

        let mut accumulator = MapAccumulator::<C>::new();
        accumulator.begin()?;

        loop {
            match tokens.expect_next()? {
                Token::EndMap => break,
                Token::Key(text) => {
                    let key = key_codec.parse(&text)?;
                    let value = value_codec.read(registry, tokens)?;
                    accumulator.add_entry(key, value)?;
                }
                // The tokenizer already rejects these sequences; kept as a
                // hard stop if it ever regresses.
                other => {
                    return Err(RescodeError::Protocol(format!(
                        "expected key or end of collection, found {}",
                        other.kind()
                    )));
                }
            }
        }

        accumulator.finalize(registry, &self.record)
    }
}

/// One suspendable write operation over a borrowed container.
///
/// The serializer is the caller-side frame: it owns the resolved codec
/// reference and the opaque resume state between calls. Drive it with
/// [`resume`](Self::resume) until [`WriteStatus::Done`], draining the writer
/// between calls.
///
/// ```rust
/// use rescode::{CodecRegistry, FrozenMap, MapSerializer, TokenWriter, WriteStatus};
///
/// let registry = CodecRegistry::with_defaults();
/// registry.register_map::<FrozenMap<String, i64>>();
///
/// let scores = FrozenMap::from_entries(vec![("alice".to_owned(), 9_i64)]);
/// let mut serializer = MapSerializer::new(&registry, &scores)?;
/// let mut writer = TokenWriter::with_threshold(16);
/// let mut output = Vec::new();
/// loop {
///     let status = serializer.resume(&mut writer)?;
///     writer.drain_to(&mut output)?;
///     if status == WriteStatus::Done {
///         break;
///     }
/// }
/// assert_eq!(output, b"{\"alice\":9}");
/// # Ok::<(), rescode::RescodeError>(())
/// ```
pub struct MapSerializer<'r, 'c, C: ImmutableMap> {
    registry: &'r CodecRegistry,
    container: &'c C,
    codec: Arc<dyn ValueCodec<C>>,
    resume_state: ResumeSlot,
    done: bool,
}

impl<'r, 'c, C: ImmutableMap> MapSerializer<'r, 'c, C> {
    /// Starts a write operation over `container`.
    ///
    /// # Errors
    ///
    /// [`RescodeError::UnsupportedType`] when `C` has no registered value
    /// codec.
    pub fn new(registry: &'r CodecRegistry, container: &'c C) -> Result<Self> {
        let codec = registry.value_codec::<C>()?;
        Ok(Self {
            registry,
            container,
            codec,
            resume_state: ResumeSlot::empty(),
            done: false,
        })
    }

    /// Continues the write until the writer requests a pause or the
    /// collection completes.
    ///
    /// # Errors
    ///
    /// [`RescodeError::InvalidState`] when called again after
    /// [`WriteStatus::Done`].
    pub fn resume(&mut self, out: &mut TokenWriter) -> Result<WriteStatus> {
        if self.done {
            return Err(RescodeError::InvalidState(
                "resume after the write completed".into(),
            ));
        }
        let status = self
            .codec
            .write(self.registry, self.container, out, &mut self.resume_state)?;
        if status == WriteStatus::Done {
            self.done = true;
        }
        Ok(status)
    }

    /// True once the collection is fully written.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<C: ImmutableMap> std::fmt::Debug for MapSerializer<'_, '_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSerializer")
            .field("done", &self.done)
            .field("suspended", &!self.resume_state.is_empty())
            .finish()
    }
}
