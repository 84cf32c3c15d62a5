//! Tools for inspecting the structure of wire documents.
//! Useful for debugging codec output and verification.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::io::DocSource;
use crate::wire::{Token, TokenReader};

/// A structural report of one wire document.
#[derive(Debug, Serialize)]
pub struct WireReport {
    /// Size of the wire payload in bytes (after decompression for persisted
    /// documents).
    pub payload_bytes: u64,
    /// Total size of the file on disk, when inspecting a file.
    pub file_size: Option<u64>,
    /// Compression id from the document header, when inspecting a file.
    pub compression_id: Option<u8>,
    /// Number of collections, including nested ones.
    pub collection_count: u64,
    /// Number of entries across all collections.
    pub entry_count: u64,
    /// Deepest collection nesting observed.
    pub max_depth: u32,
    /// Number of string value tokens.
    pub string_values: u64,
    /// Number of integer value tokens.
    pub int_values: u64,
    /// Number of float value tokens.
    pub float_values: u64,
    /// Number of boolean value tokens.
    pub bool_values: u64,
    /// Number of `null` tokens.
    pub null_values: u64,
}

/// The wire document inspector.
#[derive(Debug)]
pub struct WireInspector;

impl WireInspector {
    /// Analyzes a persisted document file.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<WireReport> {
        let source = DocSource::open(path)?;
        let payload = source.payload()?;
        let mut report = Self::inspect_bytes(&payload)?;
        report.file_size = Some(source.file_size());
        report.compression_id = Some(source.compression_id());
        Ok(report)
    }

    /// Analyzes in-memory document bytes.
    pub fn inspect_bytes(bytes: &[u8]) -> Result<WireReport> {
        let mut report = WireReport {
            payload_bytes: bytes.len() as u64,
            file_size: None,
            compression_id: None,
            collection_count: 0,
            entry_count: 0,
            max_depth: 0,
            string_values: 0,
            int_values: 0,
            float_values: 0,
            bool_values: 0,
            null_values: 0,
        };

        let mut tokens = TokenReader::new(bytes);
        let mut depth: u32 = 0;
        while let Some(token) = tokens.next()? {
            match token {
                Token::BeginMap => {
                    report.collection_count += 1;
                    depth += 1;
                    report.max_depth = report.max_depth.max(depth);
                }
                Token::EndMap => depth = depth.saturating_sub(1),
                Token::Key(_) => report.entry_count += 1,
                Token::Str(_) => report.string_values += 1,
                Token::Int(_) => report.int_values += 1,
                Token::Float(_) => report.float_values += 1,
                Token::Bool(_) => report.bool_values += 1,
                Token::Null => report.null_values += 1,
            }
        }
        Ok(report)
    }
}
