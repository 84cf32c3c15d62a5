//! Low-level document I/O: the persisted header layout, buffered file
//! writing, and memory-mapped reading.
//!
//! # Document Layout
//!
//! ```text
//! [Magic "RESC" (4)] [Version (1)] [Compression Id (1)] [Payload...]
//! ```
//!
//! The payload is the UTF-8 wire text, compressed as a whole when the
//! header's compression id says so.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::compression::decompress_by_id;
use crate::error::{RescodeError, Result};

/// Magic bytes identifying a persisted document: "RESC".
pub const MAGIC_BYTES: [u8; 4] = *b"RESC";

/// The document format version this build writes and accepts.
pub const FORMAT_VERSION: u8 = 1;

/// The fixed size of the document header.
/// Magic(4) + Version(1) + CompressionId(1) = 6
pub const DOC_HEADER_SIZE: usize = 6;

/// Builds the 6-byte document header.
pub fn doc_header(compression_id: u8) -> [u8; DOC_HEADER_SIZE] {
    let mut header = [0u8; DOC_HEADER_SIZE];
    header[0..4].copy_from_slice(&MAGIC_BYTES);
    header[4] = FORMAT_VERSION;
    header[5] = compression_id;
    header
}

/// A buffered writer appending to a document file, tracking the current
/// offset.
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
    written: u64,
}

impl FileSink {
    /// Creates (truncating) the file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Writes a complete buffer, returning the offset where it started.
    pub fn write_all(&mut self, buffer: &[u8]) -> Result<u64> {
        let start = self.written;
        self.writer.write_all(buffer)?;
        self.written += buffer.len() as u64;
        Ok(start)
    }

    /// Flushes buffered bytes to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

/// A memory-mapped view of a persisted document, header validated on open.
#[derive(Debug)]
pub struct DocSource {
    mmap: Arc<Mmap>,
    file_size: u64,
    compression_id: u8,
}

impl DocSource {
    /// Opens a document file and validates its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < DOC_HEADER_SIZE as u64 {
            return Err(RescodeError::Protocol(
                "file smaller than document header".into(),
            ));
        }

        // Safety: Mmap is fundamentally unsafe as external processes could
        // modify the file. We assume exclusive access or accept the risk for
        // performance (standard practice).
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap[0..4] != MAGIC_BYTES {
            return Err(RescodeError::Protocol("invalid magic bytes".into()));
        }
        let version = mmap[4];
        if version != FORMAT_VERSION {
            return Err(RescodeError::Protocol(format!(
                "unsupported document version: {version}"
            )));
        }
        let compression_id = mmap[5];

        Ok(Self {
            mmap: Arc::new(mmap),
            file_size,
            compression_id,
        })
    }

    /// Total size of the file on disk.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The compression id recorded in the header.
    pub fn compression_id(&self) -> u8 {
        self.compression_id
    }

    /// The decompressed wire payload.
    ///
    /// Borrows the mapping directly for uncompressed documents.
    pub fn payload(&self) -> Result<Cow<'_, [u8]>> {
        let raw = &self.mmap[DOC_HEADER_SIZE..];
        decompress_by_id(self.compression_id, raw)
    }
}
