//! One-call entry points for serializing and deserializing keyed
//! collections.
//!
//! [`Rescode`] drives the suspend/resume engine for callers that just want a
//! finished document: each resume call runs until the writer requests a
//! pause, the buffer is drained into the sink, and the loop continues until
//! the collection completes. Hosts that need to interleave other work
//! between pauses use [`MapSerializer`](crate::map::MapSerializer) directly.

use std::io::Write;
use std::path::Path;

use log::debug;

use crate::codec::WriteStatus;
use crate::compression::{Compressor, NoCompression};
use crate::emit::TokenWriter;
use crate::error::{RescodeError, Result};
use crate::io::{DocSource, FileSink, doc_header};
use crate::map::{ImmutableMap, MapSerializer};
use crate::registry::CodecRegistry;
use crate::wire::TokenReader;

/// The main entry point for whole-document operations.
#[derive(Debug)]
pub struct Rescode;

impl Rescode {
    /// Serializes a container to an in-memory document.
    pub fn to_string<C: ImmutableMap>(registry: &CodecRegistry, container: &C) -> Result<String> {
        let mut out = TokenWriter::unbounded();
        let mut serializer = MapSerializer::new(registry, container)?;
        while serializer.resume(&mut out)? != WriteStatus::Done {}
        String::from_utf8(out.take())
            .map_err(|_| RescodeError::InvalidState("writer produced invalid UTF-8".into()))
    }

    /// Serializes a container into `sink`, draining the write buffer on
    /// every pause. Returns the number of bytes written.
    ///
    /// `flush_threshold` bounds how many bytes are buffered before the
    /// engine is asked to pause; see
    /// [`constants::DEFAULT_FLUSH_THRESHOLD`](crate::constants::DEFAULT_FLUSH_THRESHOLD).
    pub fn to_writer<C, W>(
        registry: &CodecRegistry,
        container: &C,
        sink: &mut W,
        flush_threshold: usize,
    ) -> Result<u64>
    where
        C: ImmutableMap,
        W: Write,
    {
        let mut out = TokenWriter::with_threshold(flush_threshold);
        let mut serializer = MapSerializer::new(registry, container)?;
        loop {
            let status = serializer.resume(&mut out)?;
            out.drain_to(sink)?;
            if status == WriteStatus::Done {
                return Ok(out.total_flushed());
            }
        }
    }

    /// Deserializes a container from document text.
    pub fn from_str<C: ImmutableMap>(registry: &CodecRegistry, text: &str) -> Result<C> {
        Self::from_slice(registry, text.as_bytes())
    }

    /// Deserializes a container from document bytes.
    ///
    /// The document must contain exactly one collection; trailing data is a
    /// [`RescodeError::Protocol`] error.
    pub fn from_slice<C: ImmutableMap>(registry: &CodecRegistry, bytes: &[u8]) -> Result<C> {
        let codec = registry.value_codec::<C>()?;
        let mut tokens = TokenReader::new(bytes);
        let container = codec.read(registry, &mut tokens)?;
        tokens.expect_end()?;
        Ok(container)
    }

    /// Persists a container to a file, uncompressed.
    pub fn save<C, P>(registry: &CodecRegistry, path: P, container: &C) -> Result<()>
    where
        C: ImmutableMap,
        P: AsRef<Path>,
    {
        Self::save_with(registry, path, container, &NoCompression)
    }

    /// Persists a container to a file through the given compressor.
    pub fn save_with<C, P>(
        registry: &CodecRegistry,
        path: P,
        container: &C,
        compressor: &dyn Compressor,
    ) -> Result<()>
    where
        C: ImmutableMap,
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        // 1. Produce the wire payload in memory; whole-document compression
        //    needs the complete text.
        let mut payload = Vec::new();
        Self::to_writer(
            registry,
            container,
            &mut payload,
            crate::constants::DEFAULT_FLUSH_THRESHOLD,
        )?;

        // 2. Compress and frame.
        let compressed = compressor.compress(&payload)?;

        // 3. Write header + payload sequentially.
        let mut sink = FileSink::create(path)?;
        sink.write_all(&doc_header(compressor.id()))?;
        sink.write_all(&compressed)?;
        sink.flush()?;

        debug!(
            "saved document to {} ({} payload bytes, compression id {})",
            path.display(),
            compressed.len(),
            compressor.id()
        );
        Ok(())
    }

    /// Loads a container from a persisted document file.
    ///
    /// The file is memory-mapped; uncompressed payloads are tokenized
    /// straight from the mapping.
    pub fn load<C, P>(registry: &CodecRegistry, path: P) -> Result<C>
    where
        C: ImmutableMap,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let source = DocSource::open(path)?;
        let payload = source.payload()?;
        debug!(
            "loaded document from {} ({} payload bytes)",
            path.display(),
            payload.len()
        );
        Self::from_slice(registry, &payload)
    }
}
