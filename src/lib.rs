// ABOUTME: Single-pass BSON to JSON transcoder for Rust.
// ABOUTME: Provides serde decoding via JSON, a record mapper, and a document-store wrapper.

//! # serde_bsonjson
//!
//! Transcodes BSON documents straight to JSON text in one forward pass, with
//! no intermediate tree. The JSON can then be decoded into any `serde` type.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_bsonjson::{from_bson_slice, to_json};
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//! }
//!
//! // {"name": "Ana"}
//! let bytes = [
//!     0x13, 0x00, 0x00, 0x00, // document length
//!     0x02, b'n', b'a', b'm', b'e', 0x00, // string "name"
//!     0x04, 0x00, 0x00, 0x00, b'A', b'n', b'a', 0x00,
//!     0x00, // terminator
//! ];
//!
//! assert_eq!(to_json(&bytes).unwrap(), br#"{"name":"Ana"}"#);
//!
//! let person: Person = from_bson_slice(&bytes).unwrap();
//! assert_eq!(person.name, "Ana");
//! ```
//!
//! ## Type mapping
//!
//! | BSON | JSON |
//! |---|---|
//! | double | number (non-finite values are an error) |
//! | string | string |
//! | document / array | object / array |
//! | ObjectId | 24-character lowercase hex string |
//! | boolean | `true` / `false` |
//! | UTC datetime | RFC 3339 UTC string, e.g. `"1970-01-01T00:00:00Z"` |
//! | null | `null` |
//! | int32 / int64 | signed number |
//!
//! Timestamps (0x11) and Decimal128 (0x13) are rejected with
//! [`Error::UnsupportedType`]; other codes with [`Error::InvalidTypeCode`].
//!
//! ## Resource Limits
//!
//! Defaults, adjustable through [`TranscoderConfig`]:
//! - Maximum nesting depth: 64 containers, root included
//! - Maximum document size: 16 MiB
//! - Initial output reservation: at most 1,000,000 bytes

pub mod dates;
pub mod error;
pub mod mapper;
pub mod store;
pub mod transcoder;
pub mod types;
pub mod value;
mod writer;

// Re-export commonly used items at the crate root
pub use dates::{DateLayout, NamedLayout};
pub use error::{Error, Result};
pub use mapper::{to_document, Annotation, Conversion, EmbeddedMarkup, FieldDescriptor, FieldValue, Record, Schema};
pub use store::{Collection, Cursor, DocumentStore, RawCursor, SingleResult, StoreError};
pub use transcoder::{Transcoder, TranscoderConfig};
pub use types::{limits, type_code, ElementType, ObjectId};
pub use value::{Document, Value};

// The doc! macro is automatically exported at crate root via #[macro_export]

use serde::de::DeserializeOwned;

/// Transcode a BSON document into JSON bytes.
///
/// # Example
///
/// ```rust
/// use serde_bsonjson::to_json;
///
/// let empty = [0x05, 0x00, 0x00, 0x00, 0x00];
/// assert_eq!(to_json(&empty).unwrap(), b"{}");
/// ```
pub fn to_json(data: &[u8]) -> Result<Vec<u8>> {
    Transcoder::new(data).transcode()
}

/// Transcode a BSON document into JSON bytes with custom configuration.
pub fn to_json_with_config(data: &[u8], config: TranscoderConfig) -> Result<Vec<u8>> {
    Transcoder::with_config(data, config).transcode()
}

/// Transcode a BSON document into a JSON string.
pub fn to_json_string(data: &[u8]) -> Result<String> {
    let json = to_json(data)?;
    // The writer only emits validated UTF-8 and ASCII punctuation.
    String::from_utf8(json).map_err(|e| Error::from(e.utf8_error()))
}

/// Decode a BSON document into any deserializable type.
pub fn from_bson_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    from_bson_slice_with_config(data, TranscoderConfig::default())
}

/// Decode a BSON document into any deserializable type with custom configuration.
pub fn from_bson_slice_with_config<T: DeserializeOwned>(data: &[u8], config: TranscoderConfig) -> Result<T> {
    let json = to_json_with_config(data, config)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    /// `{"a": <int32>, "tags": ["x"]}`
    fn sample(n: i32) -> Vec<u8> {
        let mut body = vec![0x10, b'a', 0x00];
        body.extend_from_slice(&n.to_le_bytes());
        body.extend_from_slice(&[0x04, b't', b'a', b'g', b's', 0x00]);
        body.extend_from_slice(&[0x0e, 0x00, 0x00, 0x00]);
        body.extend_from_slice(&[0x02, b'0', 0x00, 0x02, 0x00, 0x00, 0x00, b'x', 0x00]);
        body.push(0x00);
        body.push(0x00);
        let mut doc = ((body.len() + 4) as i32).to_le_bytes().to_vec();
        doc.extend_from_slice(&body);
        doc
    }

    #[test]
    fn test_to_json_and_string() {
        let doc = sample(-3);
        assert_eq!(to_json(&doc).unwrap(), br#"{"a":-3,"tags":["x"]}"#);
        assert_eq!(to_json_string(&doc).unwrap(), r#"{"a":-3,"tags":["x"]}"#);
    }

    #[test]
    fn test_from_bson_slice() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Sample {
            a: i64,
            tags: Vec<String>,
        }

        let decoded: Sample = from_bson_slice(&sample(i32::MIN)).unwrap();
        assert_eq!(
            decoded,
            Sample {
                a: i64::from(i32::MIN),
                tags: vec!["x".into()],
            }
        );
    }

    #[test]
    fn test_from_bson_slice_type_mismatch() {
        #[derive(Debug, Deserialize)]
        struct Wrong {
            #[allow(dead_code)]
            a: String,
        }

        let err = from_bson_slice::<Wrong>(&sample(1)).unwrap_err();
        assert_eq!(err.error_type(), "json");
    }

    #[test]
    fn test_with_config() {
        let mut doc = sample(1);
        doc.push(0xff);
        assert_eq!(to_json(&doc), Err(Error::TrailingBytes));

        let config = TranscoderConfig {
            allow_trailing_bytes: true,
            ..TranscoderConfig::default()
        };
        assert_eq!(to_json_with_config(&doc, config.clone()).unwrap(), br#"{"a":1,"tags":["x"]}"#);
        let value: serde_json::Value = from_bson_slice_with_config(&doc, config).unwrap();
        assert_eq!(value["tags"][0], "x");
    }
}
