// ABOUTME: BSON document builder shared by the integration tests and benches.
// ABOUTME: Produces wire-format bytes element by element, including malformed payloads.

#![allow(dead_code)]

use serde_json::Value as JsonValue;

/// Builds one BSON document (or array body) element by element.
#[derive(Debug, Clone, Default)]
pub struct DocBuilder {
    body: Vec<u8>,
}

impl DocBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element with an arbitrary tag and payload.
    pub fn raw(mut self, tag: u8, name: &str, payload: &[u8]) -> Self {
        self.body.push(tag);
        self.body.extend_from_slice(name.as_bytes());
        self.body.push(0);
        self.body.extend_from_slice(payload);
        self
    }

    pub fn double(self, name: &str, value: f64) -> Self {
        self.raw(0x01, name, &value.to_le_bytes())
    }

    pub fn string(self, name: &str, value: &str) -> Self {
        let mut payload = ((value.len() + 1) as i32).to_le_bytes().to_vec();
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.raw(0x02, name, &payload)
    }

    pub fn document(self, name: &str, doc: DocBuilder) -> Self {
        self.raw(0x03, name, &doc.build())
    }

    /// Append an array; `items` is keyed "0", "1", ...
    pub fn array(self, name: &str, items: DocBuilder) -> Self {
        self.raw(0x04, name, &items.build())
    }

    pub fn object_id(self, name: &str, bytes: [u8; 12]) -> Self {
        self.raw(0x07, name, &bytes)
    }

    pub fn boolean(self, name: &str, value: bool) -> Self {
        self.raw(0x08, name, &[u8::from(value)])
    }

    pub fn datetime(self, name: &str, millis: i64) -> Self {
        self.raw(0x09, name, &millis.to_le_bytes())
    }

    pub fn null(self, name: &str) -> Self {
        self.raw(0x0a, name, &[])
    }

    pub fn int32(self, name: &str, value: i32) -> Self {
        self.raw(0x10, name, &value.to_le_bytes())
    }

    pub fn int64(self, name: &str, value: i64) -> Self {
        self.raw(0x12, name, &value.to_le_bytes())
    }

    /// Length prefix, body, terminator.
    pub fn build(self) -> Vec<u8> {
        let mut doc = ((self.body.len() + 5) as i32).to_le_bytes().to_vec();
        doc.extend_from_slice(&self.body);
        doc.push(0);
        doc
    }
}

/// `depth` documents nested inside each other, root included.
pub fn nested(depth: usize) -> Vec<u8> {
    let mut doc = DocBuilder::new();
    for _ in 1..depth {
        doc = DocBuilder::new().document("a", doc);
    }
    doc.build()
}

/// Encode a JSON object as BSON. Integers that fit use int32, other integers
/// int64, other numbers double.
pub fn from_json(value: &JsonValue) -> Vec<u8> {
    match value {
        JsonValue::Object(map) => map
            .iter()
            .fold(DocBuilder::new(), |doc, (key, value)| append_json(doc, key, value))
            .build(),
        other => panic!("top-level value must be an object, got {other}"),
    }
}

fn append_json(doc: DocBuilder, name: &str, value: &JsonValue) -> DocBuilder {
    match value {
        JsonValue::Null => doc.null(name),
        JsonValue::Bool(b) => doc.boolean(name, *b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(small) => doc.int32(name, small),
                Err(_) => doc.int64(name, i),
            },
            None => doc.double(name, n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => doc.string(name, s),
        JsonValue::Array(items) => {
            let body = items
                .iter()
                .enumerate()
                .fold(DocBuilder::new(), |arr, (i, item)| append_json(arr, &i.to_string(), item));
            doc.array(name, body)
        }
        JsonValue::Object(_) => doc.raw(0x03, name, &from_json(value)),
    }
}
