// ABOUTME: Error types for BSON transcoding, record mapping, and store access.
// ABOUTME: Every failure surfaces through one typed channel; nothing aborts the process.

use std::fmt;

use crate::types::ElementType;

/// The result type for bsonjson operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while transcoding, mapping, or talking to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Unexpected end of input data.
    Truncated,

    /// Unconsumed bytes after the root document was closed.
    TrailingBytes,

    /// Unrecognized element type code.
    InvalidTypeCode(u8),

    /// Recognized element type that is deliberately not transcoded.
    UnsupportedType(ElementType),

    /// Invalid UTF-8 byte sequence in a string or field name.
    InvalidUtf8,

    /// Generic malformed payload (bad string length, non-finite double, ...).
    InvalidData(String),

    /// Value cannot be represented in the output (e.g. datetime out of range).
    ValueOutOfRange,

    /// Container nesting too deep.
    MaxDepthExceeded,

    /// Document exceeds the configured size limit.
    MaxDocumentSizeExceeded,

    /// Input ended while containers were still open.
    UnclosedContainer,

    /// A terminal byte was found with no open container.
    UnbalancedContainers,

    /// Text was not a 24-character hex identifier.
    InvalidObjectId(String),

    /// A record field failed to convert.
    Field { field: String, message: String },

    /// The JSON text could not be decoded into the requested type.
    Json(String),

    /// The document store reported an error.
    Store { context: &'static str, message: String },

    /// An insert returned an identifier that is not an `ObjectId`.
    UnexpectedInsertedId(String),

    /// Custom error message (for serde integration).
    Custom(String),
}

impl Error {
    /// Returns the stable error type name.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Truncated => "truncated",
            Error::TrailingBytes => "trailing_bytes",
            Error::InvalidTypeCode(_) => "invalid_type_code",
            Error::UnsupportedType(_) => "unsupported_type",
            Error::InvalidUtf8 => "invalid_utf8",
            Error::InvalidData(_) => "invalid_data",
            Error::ValueOutOfRange => "value_out_of_range",
            Error::MaxDepthExceeded => "max_depth_exceeded",
            Error::MaxDocumentSizeExceeded => "max_document_size_exceeded",
            Error::UnclosedContainer => "unclosed_container",
            Error::UnbalancedContainers => "unbalanced_containers",
            Error::InvalidObjectId(_) => "invalid_object_id",
            Error::Field { .. } => "field_conversion",
            Error::Json(_) => "json",
            Error::Store { .. } => "store",
            Error::UnexpectedInsertedId(_) => "unexpected_inserted_id",
            Error::Custom(_) => "custom",
        }
    }

    /// Attribute this error to a record field.
    pub(crate) fn for_field(self, field: &str) -> Self {
        Error::Field {
            field: field.to_owned(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "unexpected end of input"),
            Error::TrailingBytes => write!(f, "trailing bytes after document"),
            Error::InvalidTypeCode(code) => write!(f, "unsupported type code: 0x{code:02x}"),
            Error::UnsupportedType(ty) => write!(f, "unsupported element type: {ty}"),
            Error::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::ValueOutOfRange => write!(f, "value out of range"),
            Error::MaxDepthExceeded => write!(f, "maximum container depth exceeded"),
            Error::MaxDocumentSizeExceeded => write!(f, "maximum document size exceeded"),
            Error::UnclosedContainer => write!(f, "unclosed container"),
            Error::UnbalancedContainers => write!(f, "tried to close too many containers"),
            Error::InvalidObjectId(msg) => write!(f, "invalid ObjectId: {msg}"),
            Error::Field { field, message } => write!(f, "failed to convert field {field}: {message}"),
            Error::Json(msg) => write!(f, "JSON decode error: {msg}"),
            Error::Store { context, message } => write!(f, "{context}: {message}"),
            Error::UnexpectedInsertedId(id) => {
                write!(f, "the inserted document's id is not an ObjectId: {id}")
            }
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}
