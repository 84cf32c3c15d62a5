//! The Read-Side Wire Engine.
//!
//! Handles incremental tokenization of a textual key/value document,
//! validating the collection grammar before any element codec sees a token.
//!
//! # Grammar
//!
//! A document is a single keyed collection:
//!
//! ```text
//! { "key": value , "key": value , ... }
//! ```
//!
//! Keys are always double-quoted strings (the lexical form of the native key
//! type). Values are strings, 64-bit signed integers, floats, `true`/`false`,
//! `null`, or nested collections. ASCII whitespace between tokens is
//! insignificant. Anything else is a [`RescodeError::Protocol`] error; the
//! element codecs downstream only ever receive structurally valid sequences.

use std::borrow::Cow;

use crate::constants::MAX_NESTING_DEPTH;
use crate::error::{RescodeError, Result};

/// A single lexical unit of the wire representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'d> {
    /// Start of a keyed collection (`{`).
    BeginMap,
    /// End of a keyed collection (`}`).
    EndMap,
    /// An entry key, with its trailing `:` already consumed.
    Key(Cow<'d, str>),
    /// A quoted string value.
    Str(Cow<'d, str>),
    /// A 64-bit signed integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// The `null` keyword. Recognized by the tokenizer; no shipped codec
    /// accepts it.
    Null,
}

impl Token<'_> {
    /// A short human-readable name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::BeginMap => "collection start",
            Token::EndMap => "collection end",
            Token::Key(_) => "key",
            Token::Str(_) => "string",
            Token::Int(_) => "integer",
            Token::Float(_) => "float",
            Token::Bool(_) => "boolean",
            Token::Null => "null",
        }
    }
}

/// What the tokenizer is allowed to see next inside the current collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Directly after `{`: a key, or `}` for an empty collection.
    KeyOrEnd,
    /// Directly after `,`: a key (a trailing comma is malformed).
    Key,
    /// Directly after a key's `:`: a value.
    Value,
    /// Directly after a completed value: `,` or `}`.
    SepOrEnd,
}

/// An incremental tokenizer over one wire document.
///
/// The reader owns a cursor into the input and a stack of open collections.
/// String tokens borrow from the input when they contain no escapes.
#[derive(Debug)]
pub struct TokenReader<'d> {
    input: &'d [u8],
    pos: usize,
    stack: Vec<Expect>,
    finished: bool,
}

impl<'d> TokenReader<'d> {
    /// Creates a tokenizer over a complete document.
    pub fn new(input: &'d [u8]) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
            finished: false,
        }
    }

    /// Current byte offset into the input, for error context.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Produces the next token, or `None` at a well-formed end of document.
    ///
    /// # Errors
    ///
    /// Returns [`RescodeError::Protocol`] for any grammar violation: missing
    /// or unquoted keys, missing `:`, trailing commas, unterminated
    /// collections, trailing data after the document, invalid escapes or
    /// numbers, and nesting deeper than [`MAX_NESTING_DEPTH`].
    pub fn next(&mut self) -> Result<Option<Token<'d>>> {
        self.skip_whitespace();

        match self.stack.last().copied() {
            None => {
                if self.pos >= self.input.len() {
                    return Ok(None);
                }
                if self.finished {
                    return Err(self.protocol("trailing data after document"));
                }
                let token = self.read_value_token()?;
                if self.stack.is_empty() {
                    self.finished = true;
                }
                Ok(Some(token))
            }
            Some(Expect::KeyOrEnd) => {
                if self.peek() == Some(b'}') {
                    self.pos += 1;
                    self.close_collection();
                    return Ok(Some(Token::EndMap));
                }
                self.read_key_token().map(Some)
            }
            Some(Expect::Key) => {
                if self.peek() == Some(b'}') {
                    return Err(self.protocol("trailing comma before end of collection"));
                }
                self.read_key_token().map(Some)
            }
            Some(Expect::Value) => {
                self.set_top(Expect::SepOrEnd);
                let token = self.read_value_token()?;
                Ok(Some(token))
            }
            Some(Expect::SepOrEnd) => match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.set_top(Expect::Key);
                    self.next()
                }
                Some(b'}') => {
                    self.pos += 1;
                    self.close_collection();
                    Ok(Some(Token::EndMap))
                }
                Some(_) => Err(self.protocol("expected ',' or end of collection after value")),
                None => Err(self.protocol("unterminated collection at end of document")),
            },
        }
    }

    /// Like [`next`](Self::next), but an end of document is an error.
    pub fn expect_next(&mut self) -> Result<Token<'d>> {
        match self.next()? {
            Some(token) => Ok(token),
            None => Err(self.protocol("unexpected end of document")),
        }
    }

    /// Asserts that the document is fully consumed (only whitespace remains).
    pub fn expect_end(&mut self) -> Result<()> {
        match self.next()? {
            None => Ok(()),
            Some(token) => Err(self.protocol(&format!(
                "trailing {} after document",
                token.kind()
            ))),
        }
    }

    // --- INTERNAL STATE HELPERS ---

    fn set_top(&mut self, expect: Expect) {
        if let Some(top) = self.stack.last_mut() {
            *top = expect;
        }
    }

    fn close_collection(&mut self) {
        self.stack.pop();
        if self.stack.is_empty() {
            self.finished = true;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn protocol(&self, message: &str) -> RescodeError {
        RescodeError::Protocol(format!("{message} (at byte {})", self.pos))
    }

    // --- TOKEN READERS ---

    /// Reads a key: a quoted string followed by `:`.
    fn read_key_token(&mut self) -> Result<Token<'d>> {
        match self.peek() {
            Some(b'"') => {}
            Some(_) => return Err(self.protocol("collection keys must be quoted strings")),
            None => return Err(self.protocol("unterminated collection at end of document")),
        }
        let text = self.read_string()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b':') => self.pos += 1,
            _ => return Err(self.protocol("expected ':' after key")),
        }
        self.set_top(Expect::Value);
        Ok(Token::Key(text))
    }

    /// Reads a value-position token: scalar or collection start.
    fn read_value_token(&mut self) -> Result<Token<'d>> {
        match self.peek() {
            Some(b'{') => {
                if self.stack.len() >= MAX_NESTING_DEPTH {
                    return Err(self.protocol("collection nesting too deep"));
                }
                self.pos += 1;
                self.stack.push(Expect::KeyOrEnd);
                Ok(Token::BeginMap)
            }
            Some(b'"') => Ok(Token::Str(self.read_string()?)),
            Some(b'-') | Some(b'0'..=b'9') => self.read_number(),
            Some(b't') => {
                self.read_keyword(b"true")?;
                Ok(Token::Bool(true))
            }
            Some(b'f') => {
                self.read_keyword(b"false")?;
                Ok(Token::Bool(false))
            }
            Some(b'n') => {
                self.read_keyword(b"null")?;
                Ok(Token::Null)
            }
            Some(_) => Err(self.protocol("expected a value")),
            None => Err(self.protocol("unexpected end of document, expected a value")),
        }
    }

    fn read_keyword(&mut self, word: &'static [u8]) -> Result<()> {
        let end = self.pos + word.len();
        if self.input.len() < end || &self.input[self.pos..end] != word {
            return Err(self.protocol("invalid literal"));
        }
        // The keyword must not run into an identifier tail ("nullx").
        if let Some(b) = self.input.get(end)
            && b.is_ascii_alphanumeric()
        {
            return Err(self.protocol("invalid literal"));
        }
        self.pos = end;
        Ok(())
    }

    fn read_number(&mut self) -> Result<Token<'d>> {
        let start = self.pos;
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'-' | b'+' => self.pos += 1,
                b'.' | b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let lexeme = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.protocol("invalid number"))?;
        if is_float {
            let value: f64 = lexeme
                .parse()
                .map_err(|_| self.protocol("invalid number"))?;
            Ok(Token::Float(value))
        } else {
            let value: i64 = lexeme
                .parse()
                .map_err(|_| self.protocol("invalid number"))?;
            Ok(Token::Int(value))
        }
    }

    /// Reads a quoted string, borrowing the input when it has no escapes.
    fn read_string(&mut self) -> Result<Cow<'d, str>> {
        // Opening quote already peeked by the caller.
        self.pos += 1;
        let content_start = self.pos;

        // Fast path: scan for the closing quote; bail to the owned path on
        // the first escape.
        loop {
            match self.peek() {
                Some(b'"') => {
                    let raw = &self.input[content_start..self.pos];
                    self.pos += 1;
                    let text = std::str::from_utf8(raw)
                        .map_err(|_| self.protocol("string is not valid UTF-8"))?;
                    return Ok(Cow::Borrowed(text));
                }
                Some(b'\\') => break,
                Some(b) if b < 0x20 => {
                    return Err(self.protocol("unescaped control character in string"));
                }
                Some(_) => self.pos += 1,
                None => return Err(self.protocol("unterminated string")),
            }
        }

        // Owned path: replay from the content start, decoding escapes.
        self.pos = content_start;
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Cow::Owned(out));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.protocol("unterminated escape sequence"))?;
                    self.pos += 1;
                    match escaped {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'n' => out.push('\n'),
                        b't' => out.push('\t'),
                        b'r' => out.push('\r'),
                        b'u' => out.push(self.read_unicode_escape()?),
                        _ => return Err(self.protocol("unsupported escape sequence")),
                    }
                }
                Some(b) if b < 0x20 => {
                    return Err(self.protocol("unescaped control character in string"));
                }
                Some(_) => {
                    // Consume one UTF-8 scalar worth of bytes verbatim.
                    let rest = &self.input[self.pos..];
                    let scalar_len = match std::str::from_utf8(rest) {
                        Ok(s) => s.chars().next().map(char::len_utf8),
                        Err(e) if e.valid_up_to() > 0 => {
                            let valid = std::str::from_utf8(&rest[..e.valid_up_to()])
                                .map_err(|_| self.protocol("string is not valid UTF-8"))?;
                            valid.chars().next().map(char::len_utf8)
                        }
                        Err(_) => None,
                    };
                    match scalar_len {
                        Some(len) => {
                            let chunk = std::str::from_utf8(&self.input[self.pos..self.pos + len])
                                .map_err(|_| self.protocol("string is not valid UTF-8"))?;
                            out.push_str(chunk);
                            self.pos += len;
                        }
                        None => return Err(self.protocol("string is not valid UTF-8")),
                    }
                }
                None => return Err(self.protocol("unterminated string")),
            }
        }
    }

    /// Decodes `XXXX` (and a low-surrogate pair where required) after `\u`.
    fn read_unicode_escape(&mut self) -> Result<char> {
        let high = self.read_hex4()?;
        if (0xD800..=0xDBFF).contains(&high) {
            // High surrogate: a `\uXXXX` low surrogate must follow.
            if self.input.get(self.pos) != Some(&b'\\') || self.input.get(self.pos + 1) != Some(&b'u')
            {
                return Err(self.protocol("unpaired surrogate in unicode escape"));
            }
            self.pos += 2;
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.protocol("unpaired surrogate in unicode escape"));
            }
            let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            char::from_u32(combined).ok_or_else(|| self.protocol("invalid unicode escape"))
        } else if (0xDC00..=0xDFFF).contains(&high) {
            Err(self.protocol("unpaired surrogate in unicode escape"))
        } else {
            char::from_u32(high).ok_or_else(|| self.protocol("invalid unicode escape"))
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let end = self.pos + 4;
        if self.input.len() < end {
            return Err(self.protocol("truncated unicode escape"));
        }
        let digits = std::str::from_utf8(&self.input[self.pos..end])
            .map_err(|_| self.protocol("invalid unicode escape"))?;
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| self.protocol("invalid unicode escape"))?;
        self.pos = end;
        Ok(value)
    }
}
