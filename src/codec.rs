//! Element codecs: per-type conversion between wire tokens and Rust values.
//!
//! The collection machinery never touches token text itself; it delegates
//! each key and each value to the codec resolved for the declared element
//! type. Key codecs produce and parse a string-compatible lexical form (the
//! wire always quotes keys, whatever their native type). Value codecs may be
//! *suspendable*: a codec writing a large nested value can pause under
//! back-pressure and stash its private state in the caller's [`ResumeSlot`],
//! opaque to everything above it.

use std::any::Any;

use crate::emit::TokenWriter;
use crate::error::{RescodeError, Result};
use crate::registry::CodecRegistry;
use crate::wire::{Token, TokenReader};

/// Outcome of one value-codec write step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The value is fully written.
    Done,
    /// The codec paused under back-pressure; its resume state is stashed in
    /// the [`ResumeSlot`] it was handed. Call again with the same slot to
    /// continue.
    Suspended,
}

/// Opaque storage for a suspended codec's private resume state.
///
/// The slot is owned by the caller's frame (a write cursor, or the top-level
/// operation) and survives across resume calls. Only the codec that stored a
/// state may take it back; a foreign take is an [`RescodeError::InvalidState`]
/// error rather than silent corruption.
#[derive(Default)]
pub struct ResumeSlot(Option<Box<dyn Any + Send>>);

impl std::fmt::Debug for ResumeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.0.is_some() { "suspended" } else { "empty" };
        write!(f, "ResumeSlot({state})")
    }
}

impl ResumeSlot {
    /// An empty slot.
    pub fn empty() -> Self {
        Self(None)
    }

    /// True when no suspended state is stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Stores a codec's resume state, replacing any previous state.
    pub fn store<S: Any + Send>(&mut self, state: S) {
        self.0 = Some(Box::new(state));
    }

    /// Takes the stored state back out, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RescodeError::InvalidState`] if the stored state belongs to
    /// a different codec type.
    pub fn take<S: Any + Send>(&mut self) -> Result<Option<S>> {
        match self.0.take() {
            None => Ok(None),
            Some(boxed) => match boxed.downcast::<S>() {
                Ok(state) => Ok(Some(*state)),
                Err(_) => Err(RescodeError::InvalidState(
                    "resume state does not belong to this codec".into(),
                )),
            },
        }
    }
}

/// Converts a key to and from its wire lexical form.
///
/// The writer applies quoting; `lexical` returns the bare text.
pub trait KeyCodec<K>: Send + Sync {
    /// The string-compatible lexical form of `key`.
    fn lexical(&self, key: &K) -> String;

    /// Parses a key back from its lexical form.
    fn parse(&self, text: &str) -> Result<K>;
}

/// Converts a value to and from wire tokens.
pub trait ValueCodec<T>: Send + Sync {
    /// Writes `value`, possibly suspending under back-pressure.
    ///
    /// A codec that suspends stores whatever it needs in `resume` and
    /// returns [`WriteStatus::Suspended`]; the caller will hand the same
    /// slot back on the next call. Codecs that emit a single token never
    /// suspend.
    fn write(
        &self,
        registry: &CodecRegistry,
        value: &T,
        out: &mut TokenWriter,
        resume: &mut ResumeSlot,
    ) -> Result<WriteStatus>;

    /// Reads one value from the token stream.
    fn read(&self, registry: &CodecRegistry, tokens: &mut TokenReader<'_>) -> Result<T>;
}

/// The codec for scalar element types (strings, integers, floats, bools).
///
/// One unit struct implements [`KeyCodec`]/[`ValueCodec`] for every scalar
/// type; a scalar is always a single token and never suspends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarCodec;

fn mismatch(expected: &str, found: &Token<'_>) -> RescodeError {
    RescodeError::Codec(format!("expected {expected}, found {}", found.kind()))
}

impl KeyCodec<String> for ScalarCodec {
    fn lexical(&self, key: &String) -> String {
        key.clone()
    }

    fn parse(&self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }
}

impl ValueCodec<String> for ScalarCodec {
    fn write(
        &self,
        _registry: &CodecRegistry,
        value: &String,
        out: &mut TokenWriter,
        _resume: &mut ResumeSlot,
    ) -> Result<WriteStatus> {
        out.string(value);
        Ok(WriteStatus::Done)
    }

    fn read(&self, _registry: &CodecRegistry, tokens: &mut TokenReader<'_>) -> Result<String> {
        match tokens.expect_next()? {
            Token::Str(s) => Ok(s.into_owned()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl KeyCodec<bool> for ScalarCodec {
    fn lexical(&self, key: &bool) -> String {
        key.to_string()
    }

    fn parse(&self, text: &str) -> Result<bool> {
        match text {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(RescodeError::Codec(format!(
                "invalid boolean key `{other}`"
            ))),
        }
    }
}

impl ValueCodec<bool> for ScalarCodec {
    fn write(
        &self,
        _registry: &CodecRegistry,
        value: &bool,
        out: &mut TokenWriter,
        _resume: &mut ResumeSlot,
    ) -> Result<WriteStatus> {
        out.bool(*value);
        Ok(WriteStatus::Done)
    }

    fn read(&self, _registry: &CodecRegistry, tokens: &mut TokenReader<'_>) -> Result<bool> {
        match tokens.expect_next()? {
            Token::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

/// Implements the scalar key and value codecs for integer widths in bulk.
macro_rules! impl_integer_codec {
    ($($t:ty),*) => {
        $(
            impl KeyCodec<$t> for ScalarCodec {
                fn lexical(&self, key: &$t) -> String {
                    key.to_string()
                }

                fn parse(&self, text: &str) -> Result<$t> {
                    text.parse::<$t>().map_err(|_| {
                        RescodeError::Codec(format!(
                            "invalid {} key `{text}`",
                            stringify!($t)
                        ))
                    })
                }
            }

            impl ValueCodec<$t> for ScalarCodec {
                fn write(
                    &self,
                    _registry: &CodecRegistry,
                    value: &$t,
                    out: &mut TokenWriter,
                    _resume: &mut ResumeSlot,
                ) -> Result<WriteStatus> {
                    let wide = i64::try_from(*value).map_err(|_| {
                        RescodeError::Codec(format!(
                            "{} value {value} does not fit the wire integer range",
                            stringify!($t)
                        ))
                    })?;
                    out.int(wide);
                    Ok(WriteStatus::Done)
                }

                fn read(
                    &self,
                    _registry: &CodecRegistry,
                    tokens: &mut TokenReader<'_>,
                ) -> Result<$t> {
                    match tokens.expect_next()? {
                        Token::Int(i) => <$t>::try_from(i).map_err(|_| {
                            RescodeError::Codec(format!(
                                "integer {i} out of range for {}",
                                stringify!($t)
                            ))
                        }),
                        other => Err(mismatch("integer", &other)),
                    }
                }
            }
        )*
    }
}

impl_integer_codec!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Implements the scalar value codec for float widths.
///
/// Floats are not key types. Integral floats render as integer tokens on the
/// wire, so the read side accepts either token kind. Non-finite values have
/// no wire form.
macro_rules! impl_float_codec {
    ($($t:ty),*) => {
        $(
            impl ValueCodec<$t> for ScalarCodec {
                fn write(
                    &self,
                    _registry: &CodecRegistry,
                    value: &$t,
                    out: &mut TokenWriter,
                    _resume: &mut ResumeSlot,
                ) -> Result<WriteStatus> {
                    if !value.is_finite() {
                        return Err(RescodeError::Codec(format!(
                            "non-finite {} value has no wire form",
                            stringify!($t)
                        )));
                    }
                    out.float(f64::from(*value));
                    Ok(WriteStatus::Done)
                }

                fn read(
                    &self,
                    _registry: &CodecRegistry,
                    tokens: &mut TokenReader<'_>,
                ) -> Result<$t> {
                    match tokens.expect_next()? {
                        Token::Float(v) => Ok(v as $t),
                        Token::Int(i) => Ok(i as $t),
                        other => Err(mismatch("number", &other)),
                    }
                }
            }
        )*
    }
}

impl_float_codec!(f32, f64);
