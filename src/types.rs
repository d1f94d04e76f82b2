// ABOUTME: Defines BSON element type codes, the ElementType enum, and the ObjectId type.
// ABOUTME: Type codes map directly to the byte values used on the BSON wire.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Type codes for BSON elements.
/// These match the BSON wire format exactly.
pub mod type_code {
    /// Terminates a document or array.
    pub const TERMINAL: u8 = 0x00;

    pub const DOUBLE: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const DOCUMENT: u8 = 0x03;
    pub const ARRAY: u8 = 0x04;
    pub const BINARY: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const OBJECT_ID: u8 = 0x07;
    pub const BOOLEAN: u8 = 0x08;
    pub const DATE_TIME: u8 = 0x09;
    pub const NULL: u8 = 0x0a;
    pub const REGEX: u8 = 0x0b;
    pub const DB_POINTER: u8 = 0x0c;
    pub const JAVASCRIPT: u8 = 0x0d;
    pub const SYMBOL: u8 = 0x0e;
    pub const JAVASCRIPT_WITH_SCOPE: u8 = 0x0f;
    pub const INT32: u8 = 0x10;
    pub const TIMESTAMP: u8 = 0x11;
    pub const INT64: u8 = 0x12;
    pub const DECIMAL128: u8 = 0x13;
    pub const MAX_KEY: u8 = 0x7f;
    pub const MIN_KEY: u8 = 0xff;

    /// Boolean payload bytes
    pub const FALSE: u8 = 0x00;
    pub const TRUE: u8 = 0x01;
}

/// The element types the transcoder recognizes.
///
/// Anything outside this set is rejected with [`Error::InvalidTypeCode`].
/// `Timestamp` and `Decimal128` are recognized only so that they can be
/// rejected with [`Error::UnsupportedType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Double,
    String,
    Document,
    Array,
    ObjectId,
    Boolean,
    DateTime,
    Null,
    Int32,
    /// Legacy internal timestamp (increment + seconds).
    Timestamp,
    Int64,
    Decimal128,
}

impl ElementType {
    /// Look up an element type by its wire code.
    #[inline]
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            type_code::DOUBLE => Some(Self::Double),
            type_code::STRING => Some(Self::String),
            type_code::DOCUMENT => Some(Self::Document),
            type_code::ARRAY => Some(Self::Array),
            type_code::OBJECT_ID => Some(Self::ObjectId),
            type_code::BOOLEAN => Some(Self::Boolean),
            type_code::DATE_TIME => Some(Self::DateTime),
            type_code::NULL => Some(Self::Null),
            type_code::INT32 => Some(Self::Int32),
            type_code::TIMESTAMP => Some(Self::Timestamp),
            type_code::INT64 => Some(Self::Int64),
            type_code::DECIMAL128 => Some(Self::Decimal128),
            _ => None,
        }
    }

    /// The wire code for this element type.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Double => type_code::DOUBLE,
            Self::String => type_code::STRING,
            Self::Document => type_code::DOCUMENT,
            Self::Array => type_code::ARRAY,
            Self::ObjectId => type_code::OBJECT_ID,
            Self::Boolean => type_code::BOOLEAN,
            Self::DateTime => type_code::DATE_TIME,
            Self::Null => type_code::NULL,
            Self::Int32 => type_code::INT32,
            Self::Timestamp => type_code::TIMESTAMP,
            Self::Int64 => type_code::INT64,
            Self::Decimal128 => type_code::DECIMAL128,
        }
    }

    /// Returns true for the types that open a nested container.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Document | Self::Array)
    }

    /// A short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Document => "document",
            Self::Array => "array",
            Self::ObjectId => "objectId",
            Self::Boolean => "bool",
            Self::DateTime => "date",
            Self::Null => "null",
            Self::Int32 => "int",
            Self::Timestamp => "timestamp",
            Self::Int64 => "long",
            Self::Decimal128 => "decimal",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.code())
    }
}

/// A 12-byte document identifier.
///
/// Rendered as 24 lowercase hex characters in text form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Number of raw bytes in an identifier.
    pub const LEN: usize = 12;

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parse an identifier from its 24-character hex form.
    pub fn parse_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::InvalidObjectId(format!("{s:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Write the lowercase hex form into `out`.
    #[inline]
    pub(crate) fn encode_hex(&self, out: &mut [u8; 24]) {
        // The output buffer is exactly twice the input length, so this cannot fail.
        let _ = hex::encode_to_slice(self.0, out);
    }

    /// The lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}

/// Default resource limits.
pub mod limits {
    /// Maximum container nesting depth, counting the root document
    pub const MAX_DEPTH: usize = 64;

    /// Maximum document size in bytes (the store's 16 MiB document cap)
    pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

    /// Upper bound on the output buffer's initial reservation
    pub const INITIAL_CAPACITY_CEILING: usize = 1_000_000;

    /// Smallest well-formed document: length prefix plus terminal byte
    pub const MIN_DOCUMENT_SIZE: usize = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_codes() {
        for code in 0u8..=0xff {
            if let Some(ty) = ElementType::from_code(code) {
                assert_eq!(ty.code(), code);
            }
        }
        assert_eq!(ElementType::from_code(type_code::DOUBLE), Some(ElementType::Double));
        assert_eq!(ElementType::from_code(type_code::DECIMAL128), Some(ElementType::Decimal128));
        assert_eq!(ElementType::from_code(type_code::BINARY), None);
        assert_eq!(ElementType::from_code(type_code::MIN_KEY), None);
        assert_eq!(ElementType::from_code(type_code::TERMINAL), None);
    }

    #[test]
    fn test_container_types() {
        assert!(ElementType::Document.is_container());
        assert!(ElementType::Array.is_container());
        assert!(!ElementType::String.is_container());
    }

    #[test]
    fn test_element_type_display() {
        assert_eq!(ElementType::Decimal128.to_string(), "decimal (0x13)");
        assert_eq!(ElementType::Timestamp.to_string(), "timestamp (0x11)");
    }

    #[test]
    fn test_object_id_hex() {
        let oid = ObjectId::from_bytes([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67,
        ]);
        assert_eq!(oid.to_hex(), "0123456789abcdef01234567");
        assert_eq!("0123456789ABCDEF01234567".parse::<ObjectId>().unwrap(), oid);

        let mut out = [0u8; 24];
        oid.encode_hex(&mut out);
        assert_eq!(&out, b"0123456789abcdef01234567");
    }

    #[test]
    fn test_object_id_rejects_bad_hex() {
        assert!(matches!(ObjectId::parse_str("xyz"), Err(Error::InvalidObjectId(_))));
        assert!(matches!(ObjectId::parse_str("0123"), Err(Error::InvalidObjectId(_))));
        assert!(matches!(
            ObjectId::parse_str("0123456789abcdef0123456g"),
            Err(Error::InvalidObjectId(_))
        ));
    }
}
