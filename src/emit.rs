//! The Write-Side Wire Engine.
//!
//! [`TokenWriter`] buffers emitted tokens and exposes the back-pressure
//! query ([`TokenWriter::should_pause`]) that drives cooperative suspension:
//! once the internal buffer crosses its flush threshold, producers are asked
//! to pause after their current sub-step so the caller can drain the buffer
//! into a real sink.
//!
//! The writer owns all structural punctuation (separators, quoting,
//! escaping). Producers only name keys and values; this keeps the emitted
//! byte sequence identical whether a collection is written in one call or
//! across many suspensions.

use std::io::Write;

use crate::constants::DEFAULT_FLUSH_THRESHOLD;
use crate::error::Result;

/// A buffered writer for the textual key/value wire representation.
#[derive(Debug)]
pub struct TokenWriter {
    buf: Vec<u8>,
    flush_threshold: usize,
    flushed: u64,
    /// A `,` is owed before the next key at the current position.
    pending_separator: bool,
}

impl TokenWriter {
    /// Creates a writer with the default flush threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_FLUSH_THRESHOLD)
    }

    /// Creates a writer that requests a pause once `flush_threshold` bytes
    /// are buffered.
    pub fn with_threshold(flush_threshold: usize) -> Self {
        Self {
            buf: Vec::new(),
            flush_threshold,
            flushed: 0,
            pending_separator: false,
        }
    }

    /// Creates a writer that never requests a pause.
    pub fn unbounded() -> Self {
        Self::with_threshold(usize::MAX)
    }

    /// Back-pressure query: true once the buffer has reached the flush
    /// threshold. Producers check this between sub-steps and suspend.
    pub fn should_pause(&self) -> bool {
        self.buf.len() >= self.flush_threshold
    }

    /// Opens a keyed collection.
    pub fn begin_map(&mut self) {
        self.pending_separator = false;
        self.buf.push(b'{');
    }

    /// Closes the current keyed collection.
    pub fn end_map(&mut self) {
        self.pending_separator = false;
        self.buf.push(b'}');
    }

    /// Emits an entry key in quoted lexical form, preceded by a separator
    /// when one is owed, and followed by `:`.
    pub fn key(&mut self, lexical: &str) {
        if self.pending_separator {
            self.buf.push(b',');
            self.pending_separator = false;
        }
        self.push_quoted(lexical);
        self.buf.push(b':');
    }

    /// Marks the current entry complete. The next key at this position owes
    /// a separator.
    pub fn end_entry(&mut self) {
        self.pending_separator = true;
    }

    /// Emits a quoted string value.
    pub fn string(&mut self, value: &str) {
        self.push_quoted(value);
    }

    /// Emits an integer value.
    pub fn int(&mut self, value: i64) {
        self.buf.extend_from_slice(value.to_string().as_bytes());
    }

    /// Emits a floating point value.
    ///
    /// Uses the shortest decimal form that round-trips. Integral floats
    /// render without a fraction (`2` rather than `2.0`); readers accept an
    /// integer token where a float is declared.
    pub fn float(&mut self, value: f64) {
        self.buf.extend_from_slice(value.to_string().as_bytes());
    }

    /// Emits a boolean value.
    pub fn bool(&mut self, value: bool) {
        self.buf
            .extend_from_slice(if value { b"true" } else { b"false" });
    }

    /// The bytes currently buffered (not yet drained).
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Total bytes emitted so far: drained plus still buffered.
    pub fn total_emitted(&self) -> u64 {
        self.flushed + self.buf.len() as u64
    }

    /// Total bytes drained into sinks so far.
    pub fn total_flushed(&self) -> u64 {
        self.flushed
    }

    /// Drains the buffer into `sink`, clearing the back-pressure condition.
    pub fn drain_to<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.buf)?;
        self.flushed += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }

    /// Takes the buffered bytes, clearing the back-pressure condition.
    pub fn take(&mut self) -> Vec<u8> {
        self.flushed += self.buf.len() as u64;
        std::mem::take(&mut self.buf)
    }

    /// Writes `"..."` with wire escaping applied.
    fn push_quoted(&mut self, text: &str) {
        self.buf.push(b'"');
        for ch in text.chars() {
            match ch {
                '"' => self.buf.extend_from_slice(b"\\\""),
                '\\' => self.buf.extend_from_slice(b"\\\\"),
                '\n' => self.buf.extend_from_slice(b"\\n"),
                '\t' => self.buf.extend_from_slice(b"\\t"),
                '\r' => self.buf.extend_from_slice(b"\\r"),
                c if (c as u32) < 0x20 => {
                    self.buf
                        .extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
                }
                c => {
                    let mut utf8 = [0u8; 4];
                    self.buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
        self.buf.push(b'"');
    }
}

impl Default for TokenWriter {
    fn default() -> Self {
        Self::new()
    }
}
