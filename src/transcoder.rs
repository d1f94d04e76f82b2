// ABOUTME: Single-pass BSON to JSON transcoder.
// ABOUTME: Walks elements sequentially with an explicit bounded frame stack instead of recursion.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::types::{limits, type_code, ElementType, ObjectId};
use crate::writer::JsonWriter;

/// Validate and convert bytes to a UTF-8 string.
/// Uses simdutf8 for SIMD-accelerated validation when the feature is enabled.
#[cfg(feature = "simd-utf8")]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

#[cfg(not(feature = "simd-utf8"))]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

/// Configuration options for the transcoder.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Maximum container nesting depth, root included (default and upper bound: 64)
    pub max_depth: usize,
    /// Maximum input size in bytes
    pub max_document_size: usize,
    /// Upper bound on the output buffer's initial reservation
    pub initial_capacity_ceiling: usize,
    /// Allow bytes after the root document's terminal byte (default: false)
    pub allow_trailing_bytes: bool,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            max_depth: limits::MAX_DEPTH,
            max_document_size: limits::MAX_DOCUMENT_SIZE,
            initial_capacity_ceiling: limits::INITIAL_CAPACITY_CEILING,
            allow_trailing_bytes: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Document,
    Array,
}

impl FrameKind {
    #[inline]
    const fn opening(self) -> u8 {
        match self {
            FrameKind::Document => b'{',
            FrameKind::Array => b'[',
        }
    }

    #[inline]
    const fn closing(self) -> u8 {
        match self {
            FrameKind::Document => b'}',
            FrameKind::Array => b']',
        }
    }
}

/// One open container.
#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    /// Whether a member has been written yet (drives comma placement)
    has_members: bool,
}

const EMPTY_FRAME: Frame = Frame {
    kind: FrameKind::Document,
    has_members: false,
};

/// Fixed-capacity stack of open containers, bounds-checked on every push.
struct FrameStack {
    frames: [Frame; limits::MAX_DEPTH],
    len: usize,
    limit: usize,
}

impl FrameStack {
    fn new(limit: usize) -> Self {
        Self {
            frames: [EMPTY_FRAME; limits::MAX_DEPTH],
            len: 0,
            limit: limit.min(limits::MAX_DEPTH),
        }
    }

    #[inline]
    fn push(&mut self, kind: FrameKind) -> Result<()> {
        if self.len >= self.limit {
            return Err(Error::MaxDepthExceeded);
        }
        self.frames[self.len] = Frame {
            kind,
            has_members: false,
        };
        self.len += 1;
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Frame> {
        if self.len == 0 {
            return Err(Error::UnbalancedContainers);
        }
        self.len -= 1;
        Ok(self.frames[self.len])
    }

    #[inline]
    fn top_mut(&mut self) -> Result<&mut Frame> {
        match self.len {
            0 => Err(Error::UnbalancedContainers),
            n => Ok(&mut self.frames[n - 1]),
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A BSON to JSON transcoder over a byte slice.
///
/// Produces either the complete JSON text or an error; never a partial result.
pub struct Transcoder<'a> {
    data: &'a [u8],
    pos: usize,
    config: TranscoderConfig,
}

impl<'a> Transcoder<'a> {
    /// Create a new transcoder for the given document.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, TranscoderConfig::default())
    }

    /// Create a new transcoder with custom configuration.
    #[must_use]
    pub fn with_config(data: &'a [u8], config: TranscoderConfig) -> Self {
        Self { data, pos: 0, config }
    }

    /// Get the current position in the input.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the transcoder configuration.
    #[must_use]
    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// Transcode the whole document into JSON bytes.
    pub fn transcode(mut self) -> Result<Vec<u8>> {
        let mut out =
            JsonWriter::with_capacity_hint(self.data.len(), self.config.initial_capacity_ceiling);
        match self.run(&mut out) {
            Ok(()) => {
                let json = out.into_inner();
                tracing::trace!(input = self.data.len(), output = json.len(), "transcoded bson document");
                Ok(json)
            }
            Err(err) => {
                tracing::debug!(offset = self.pos, error = %err, "bson transcode failed");
                Err(err)
            }
        }
    }

    fn run(&mut self, out: &mut JsonWriter) -> Result<()> {
        if self.data.len() > self.config.max_document_size {
            return Err(Error::MaxDocumentSizeExceeded);
        }
        if self.data.len() < limits::MIN_DOCUMENT_SIZE {
            return Err(Error::Truncated);
        }

        // The length prefix is informational; elements are walked sequentially.
        self.skip(4)?;
        let mut stack = FrameStack::new(self.config.max_depth);
        stack.push(FrameKind::Document)?;
        out.write_byte(FrameKind::Document.opening());

        while !stack.is_empty() {
            if self.pos >= self.data.len() {
                return Err(Error::UnclosedContainer);
            }
            let tc = self.read_byte()?;
            if tc == type_code::TERMINAL {
                let frame = stack.pop()?;
                out.write_byte(frame.kind.closing());
                continue;
            }

            let ty = ElementType::from_code(tc).ok_or(Error::InvalidTypeCode(tc))?;
            if matches!(ty, ElementType::Timestamp | ElementType::Decimal128) {
                return Err(Error::UnsupportedType(ty));
            }

            let name = self.read_cstring()?;
            let frame = stack.top_mut()?;
            if frame.has_members {
                out.write_comma();
            }
            frame.has_members = true;
            // Array members carry their index as a name; JSON arrays keep positions implicit.
            if frame.kind == FrameKind::Document {
                out.write_key(name);
            }

            self.write_value(ty, out, &mut stack)?;
        }

        if !self.config.allow_trailing_bytes && self.pos < self.data.len() {
            return Err(Error::TrailingBytes);
        }
        Ok(())
    }

    /// Decode one payload and write its JSON form.
    fn write_value(&mut self, ty: ElementType, out: &mut JsonWriter, stack: &mut FrameStack) -> Result<()> {
        match ty {
            ElementType::Double => {
                let value = self.read_f64()?;
                if !value.is_finite() {
                    return Err(Error::InvalidData(format!("{value} has no JSON representation")));
                }
                out.write_display(value);
            }
            ElementType::String => {
                let s = self.read_string()?;
                out.write_str(s);
            }
            ElementType::Document => self.open_container(FrameKind::Document, out, stack)?,
            ElementType::Array => self.open_container(FrameKind::Array, out, stack)?,
            ElementType::ObjectId => {
                let oid = ObjectId::from_bytes(self.read_array::<{ ObjectId::LEN }>()?);
                let mut hex = [0u8; 24];
                oid.encode_hex(&mut hex);
                out.write_byte(b'"');
                out.write_raw(&hex);
                out.write_byte(b'"');
            }
            ElementType::Boolean => {
                let literal: &[u8] = if self.read_byte()? == type_code::TRUE { b"true" } else { b"false" };
                out.write_raw(literal);
            }
            ElementType::DateTime => {
                let millis = self.read_i64()?;
                let time = DateTime::<Utc>::from_timestamp_millis(millis).ok_or(Error::ValueOutOfRange)?;
                out.write_quoted_display(time.format("%Y-%m-%dT%H:%M:%S%.fZ"));
            }
            ElementType::Null => out.write_raw(b"null"),
            ElementType::Int32 => out.write_display(self.read_i32()?),
            ElementType::Int64 => out.write_display(self.read_i64()?),
            ElementType::Timestamp | ElementType::Decimal128 => return Err(Error::UnsupportedType(ty)),
        }
        Ok(())
    }

    fn open_container(&mut self, kind: FrameKind, out: &mut JsonWriter, stack: &mut FrameStack) -> Result<()> {
        // Nested length prefix is unused by the sequential walk.
        self.skip(4)?;
        stack.push(kind)?;
        out.write_byte(kind.opening());
        Ok(())
    }

    // =========================================================================
    // Bounds-checked readers
    // =========================================================================

    /// Read a single byte, advancing position.
    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(Error::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read exactly n bytes.
    #[inline]
    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::Truncated)?;
        let bytes = self.data.get(self.pos..end).ok_or(Error::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    #[inline]
    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    #[inline]
    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    #[inline]
    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Read a NUL-terminated field name.
    fn read_cstring(&mut self) -> Result<&'a str> {
        let rest = self.data.get(self.pos..).ok_or(Error::Truncated)?;
        let len = memchr::memchr(type_code::TERMINAL, rest).ok_or(Error::Truncated)?;
        let name = validate_utf8(&rest[..len])?;
        self.pos += len + 1;
        Ok(name)
    }

    /// Read a length-prefixed string payload; the length counts the trailing NUL.
    fn read_string(&mut self) -> Result<&'a str> {
        let len = self.read_i32()?;
        if len < 1 {
            return Err(Error::InvalidData(format!("invalid string length {len}")));
        }
        let bytes = self.read_bytes(len as usize)?;
        let (terminator, content) = bytes.split_last().ok_or(Error::Truncated)?;
        if *terminator != type_code::TERMINAL {
            return Err(Error::InvalidData("string is not NUL-terminated".into()));
        }
        validate_utf8(content)
    }
}
