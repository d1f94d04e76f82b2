// ABOUTME: Schema-driven conversion of records into ordered documents.
// ABOUTME: Field descriptors and conversion annotations drive the mapping.

//! # Record mapping
//!
//! A [`Record`] exposes a static [`Schema`] (built once per type) and the
//! value of each field as a [`FieldValue`]. [`to_document`] walks the schema
//! and produces a [`Document`], applying each field's conversion.
//!
//! Conversion annotations use four comma-separated positional fields:
//!
//! ```text
//! name,conversion,omitempty,dateFormat
//! ```
//!
//! - `name` overrides every other name source when non-empty.
//! - `conversion` is empty (none), `$oid`, `$date`, or `$json`.
//! - a non-empty third field omits the field when its value is empty.
//! - `dateFormat` (only with `$date`) names a [`NamedLayout`](crate::dates::NamedLayout)
//!   or is a literal chrono pattern. It is the last field, so it may contain commas.
//!
//! ```rust
//! use std::sync::OnceLock;
//! use serde_bsonjson::mapper::{to_document, FieldDescriptor, FieldValue, Record, Schema};
//!
//! struct User {
//!     id: String,
//!     name: String,
//!     nickname: Option<String>,
//! }
//!
//! impl Record for User {
//!     fn schema(&self) -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::new([
//!                 FieldDescriptor::new("id").annotation("_id,$oid"),
//!                 FieldDescriptor::new("name"),
//!                 FieldDescriptor::new("nickname").annotation(",,omitempty"),
//!             ])
//!         })
//!     }
//!
//!     fn field(&self, index: usize) -> FieldValue<'_> {
//!         match index {
//!             0 => (&self.id).into(),
//!             1 => (&self.name).into(),
//!             2 => self.nickname.as_ref().into(),
//!             _ => FieldValue::Absent,
//!         }
//!     }
//! }
//!
//! let user = User { id: "0123456789abcdef01234567".into(), name: "Ana".into(), nickname: None };
//! let doc = to_document(&user).unwrap();
//! assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["_id", "name"]);
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::dates::DateLayout;
use crate::error::{Error, Result};
use crate::types::ObjectId;
use crate::value::{Document, Value};

/// Name that removes a field from the output when given as a storage name or annotation name.
pub const SKIP_NAME: &str = "-";

/// The conversion applied to a field's value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Conversion {
    #[default]
    None,
    /// Hex text to [`ObjectId`] (`$oid`)
    ObjectIdFromHex,
    /// Text parsed with a layout, or integer milliseconds since the epoch (`$date`)
    Date(DateLayout),
    /// Pre-serialized JSON inlined as structured data (`$json`)
    EmbeddedJson,
}

impl Conversion {
    /// The annotation token for this conversion.
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Conversion::None => "",
            Conversion::ObjectIdFromHex => "$oid",
            Conversion::Date(_) => "$date",
            Conversion::EmbeddedJson => "$json",
        }
    }
}

/// A parsed conversion annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotation {
    pub name: Option<String>,
    pub conversion: Conversion,
    pub omit_empty: bool,
}

impl Annotation {
    /// Parse `name,conversion,omitempty,dateFormat`. Missing fields are empty;
    /// unknown conversion tokens mean no conversion.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let mut parts = tag.splitn(4, ',');
        let name = parts
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let kind = parts.next().unwrap_or("").trim();
        let omit_empty = parts.next().is_some_and(|flag| !flag.trim().is_empty());
        let date_format = parts.next().unwrap_or("");

        let conversion = match kind {
            "$oid" => Conversion::ObjectIdFromHex,
            "$date" => Conversion::Date(DateLayout::resolve(date_format)),
            "$json" => Conversion::EmbeddedJson,
            _ => Conversion::None,
        };

        Self {
            name,
            conversion,
            omit_empty,
        }
    }
}

/// Declarative description of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    ident: &'static str,
    alt_name: Option<&'static str>,
    storage_name: Option<&'static str>,
    annotation: Annotation,
}

impl FieldDescriptor {
    /// Describe a field by its identifier.
    #[must_use]
    pub fn new(ident: &'static str) -> Self {
        Self {
            ident,
            alt_name: None,
            storage_name: None,
            annotation: Annotation::default(),
        }
    }

    /// Alternate (serialization) name; `-` is ignored here.
    #[must_use]
    pub fn alt_name(mut self, name: &'static str) -> Self {
        self.alt_name = Some(name);
        self
    }

    /// Storage name; `-` skips the field.
    #[must_use]
    pub fn storage_name(mut self, name: &'static str) -> Self {
        self.storage_name = Some(name);
        self
    }

    /// Conversion annotation in the `name,conversion,omitempty,dateFormat` form.
    #[must_use]
    pub fn annotation(mut self, tag: &str) -> Self {
        self.annotation = Annotation::parse(tag);
        self
    }

    #[must_use]
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// The output name, or `None` when the field is skipped.
    ///
    /// Later sources override earlier ones: identifier, alternate name,
    /// storage name, annotation name.
    #[must_use]
    pub fn resolve_name(&self) -> Option<&str> {
        let mut name = self.ident;
        if let Some(alt) = self.alt_name.map(str::trim) {
            if !alt.is_empty() && alt != SKIP_NAME {
                name = alt;
            }
        }
        if let Some(storage) = self.storage_name.map(str::trim) {
            if !storage.is_empty() {
                name = storage;
            }
        }
        if let Some(annotated) = self.annotation.name.as_deref() {
            name = annotated;
        }
        (name != SKIP_NAME).then_some(name)
    }
}

#[derive(Debug, Clone)]
struct SchemaField {
    name: Option<String>,
    annotation: Annotation,
}

/// The ordered fields of a record type, with names resolved at construction.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let fields = descriptors
            .into_iter()
            .map(|descriptor| SchemaField {
                name: descriptor.resolve_name().map(str::to_owned),
                annotation: descriptor.annotation,
            })
            .collect();
        Self { fields }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Output names of the fields that are not skipped, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| f.name.as_deref())
    }
}

/// A type whose instances can be mapped into a [`Document`].
pub trait Record {
    /// The schema shared by every instance of the type.
    fn schema(&self) -> &'static Schema;

    /// The value of the field at `index` in schema order.
    fn field(&self, index: usize) -> FieldValue<'_>;
}

/// A value that carries already-serialized JSON.
pub trait EmbeddedMarkup {
    fn markup_bytes(&self) -> &[u8];
}

/// What a record field holds, as far as the mapper is concerned.
pub enum FieldValue<'a> {
    /// An absent optional value
    Absent,
    Str(&'a str),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    /// Raw JSON bytes; requires the `$json` conversion
    Bytes(&'a [u8]),
    /// Pre-serialized JSON, always inlined
    Markup(&'a dyn EmbeddedMarkup),
    /// A nested record
    Record(&'a dyn Record),
    List(Vec<FieldValue<'a>>),
    /// Passed through unchanged
    Value(Value),
}

impl FieldValue<'_> {
    fn is_empty(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int32(n) => *n == 0,
            FieldValue::Int64(n) => *n == 0,
            FieldValue::Double(n) => *n == 0.0,
            FieldValue::Bool(b) => !b,
            FieldValue::Bytes(b) => b.is_empty(),
            FieldValue::Markup(m) => m.markup_bytes().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Value(v) => v.is_null(),
            FieldValue::Time(_) | FieldValue::Record(_) => false,
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(s: &'a str) -> Self {
        FieldValue::Str(s)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(s: &'a String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(n: i32) -> Self {
        FieldValue::Int32(n)
    }
}

impl From<&i32> for FieldValue<'_> {
    fn from(n: &i32) -> Self {
        FieldValue::Int32(*n)
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(n: i64) -> Self {
        FieldValue::Int64(n)
    }
}

impl From<&i64> for FieldValue<'_> {
    fn from(n: &i64) -> Self {
        FieldValue::Int64(*n)
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(n: f64) -> Self {
        FieldValue::Double(n)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue<'_> {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

impl<'a> From<&'a [u8]> for FieldValue<'a> {
    fn from(b: &'a [u8]) -> Self {
        FieldValue::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for FieldValue<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

impl From<ObjectId> for FieldValue<'_> {
    fn from(oid: ObjectId) -> Self {
        FieldValue::Value(Value::ObjectId(oid))
    }
}

impl From<Value> for FieldValue<'_> {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

impl<'a, T: Into<FieldValue<'a>>> From<Option<T>> for FieldValue<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Absent, Into::into)
    }
}

/// Map a record into a document, in schema order.
///
/// Conversion failures are reported as [`Error::Field`] naming the field
/// (dotted for nested records).
pub fn to_document(record: &dyn Record) -> Result<Document> {
    let schema = record.schema();
    let mut doc = Document::new();
    for (index, field) in schema.fields.iter().enumerate() {
        let Some(name) = field.name.as_deref() else {
            continue;
        };
        let value = record.field(index);
        if field.annotation.omit_empty && value.is_empty() {
            continue;
        }
        let converted = convert(value, &field.annotation.conversion).map_err(|err| match err {
            Error::Field { field, message } => Error::Field {
                field: format!("{name}.{field}"),
                message,
            },
            other => other.for_field(name),
        })?;
        doc.insert(name, converted);
    }
    Ok(doc)
}

fn convert(value: FieldValue<'_>, conversion: &Conversion) -> Result<Value> {
    match value {
        FieldValue::Absent => Ok(Value::Null),
        FieldValue::Str(s) => match conversion {
            Conversion::None => Ok(Value::String(s.to_owned())),
            Conversion::ObjectIdFromHex => ObjectId::parse_str(s).map(Value::ObjectId),
            Conversion::Date(layout) => layout.parse(s).map(Value::DateTime),
            Conversion::EmbeddedJson => Ok(Value::String(s.to_owned())),
        },
        FieldValue::Int32(n) => match conversion {
            Conversion::Date(_) => millis_to_datetime(i64::from(n)),
            _ => Ok(Value::Int32(n)),
        },
        FieldValue::Int64(n) => match conversion {
            Conversion::Date(_) => millis_to_datetime(n),
            _ => Ok(Value::Int64(n)),
        },
        FieldValue::Double(n) => Ok(Value::Double(n)),
        FieldValue::Bool(b) => Ok(Value::Bool(b)),
        FieldValue::Time(t) => Ok(Value::DateTime(t)),
        FieldValue::Bytes(bytes) => match conversion {
            Conversion::EmbeddedJson => parse_embedded(bytes),
            other => Err(Error::InvalidData(format!(
                "byte fields need the $json conversion, not {:?}",
                other.token()
            ))),
        },
        FieldValue::Markup(markup) => parse_embedded(markup.markup_bytes()),
        FieldValue::Record(nested) => to_document(nested).map(Value::Document),
        FieldValue::List(items) => items
            .into_iter()
            .map(|item| convert(item, conversion))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        FieldValue::Value(v) => Ok(v),
    }
}

/// Milliseconds since the epoch; 0 is the zero instant, 0001-01-01T00:00:00Z.
fn millis_to_datetime(millis: i64) -> Result<Value> {
    if millis == 0 {
        return zero_instant().map(Value::DateTime);
    }
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(Value::DateTime)
        .ok_or(Error::ValueOutOfRange)
}

fn zero_instant() -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or(Error::ValueOutOfRange)
}

/// Parse embedded JSON; empty input is null.
fn parse_embedded(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    let json: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(Value::from(json))
}
