// ABOUTME: Document-store wrapper that hands back JSON instead of binary documents.
// ABOUTME: Every retrieved document passes through the transcoder before typed decoding.

//! # Store wrapper
//!
//! [`Collection`] sits on top of a caller-supplied [`DocumentStore`] backend.
//! Queries return [`Cursor`]s and [`SingleResult`]s whose documents come out
//! as JSON bytes or as any `serde` type. The backend owns the wire protocol
//! and the binary encoding of outgoing documents.

use std::fmt;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::mapper::{to_document, Record};
use crate::transcoder::{Transcoder, TranscoderConfig};
use crate::value::{Document, Value};

/// Errors reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A single-document query matched nothing.
    NoDocuments,
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoDocuments => write!(f, "no documents in result"),
            StoreError::Backend(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result type for backend calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub limit: Option<i64>,
    pub skip: Option<u64>,
    pub batch_size: Option<u32>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneOptions {
    pub skip: Option<u64>,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOptions {
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOneOptions {
    pub bypass_document_validation: Option<bool>,
}

/// A server-side cursor over binary documents.
pub trait RawCursor {
    /// Move to the next document. Returns `false` once the cursor is exhausted.
    fn advance(&mut self) -> StoreResult<bool>;

    /// Binary bytes of the current document.
    fn current(&self) -> &[u8];

    /// Server-side cursor id; 0 once exhausted.
    fn id(&self) -> i64;

    fn close(&mut self) -> StoreResult<()>;
}

/// The backend operations a [`Collection`] needs.
pub trait DocumentStore {
    type Cursor: RawCursor;

    fn find(&self, filter: &Document, options: &FindOptions) -> StoreResult<Self::Cursor>;

    /// The binary bytes of the first match, or [`StoreError::NoDocuments`].
    fn find_one(&self, filter: &Document, options: &FindOneOptions) -> StoreResult<Vec<u8>>;

    fn aggregate(&self, pipeline: &[Document], options: &AggregateOptions) -> StoreResult<Self::Cursor>;

    /// Insert a document and return the id the store assigned or kept.
    fn insert_one(&self, document: &Document, options: &InsertOneOptions) -> StoreResult<Value>;
}

fn wrap(context: &'static str, err: StoreError) -> Error {
    debug!("{} failed: {}", context, err);
    Error::Store {
        context,
        message: err.to_string(),
    }
}

/// A named collection backed by a [`DocumentStore`].
pub struct Collection<S> {
    name: String,
    store: S,
    config: TranscoderConfig,
}

impl<S: DocumentStore> Collection<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self::with_config(name, store, TranscoderConfig::default())
    }

    /// Use `config` when transcoding the documents this collection returns.
    pub fn with_config(name: impl Into<String>, store: S, config: TranscoderConfig) -> Self {
        Self {
            name: name.into(),
            store,
            config,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn find(&self, filter: &Document, options: FindOptions) -> Result<Cursor<S::Cursor>> {
        debug!("find on {}: {}", self.name, filter);
        let inner = self.store.find(filter, &options).map_err(|e| wrap("failed to find", e))?;
        Ok(Cursor::new(inner, self.config.clone()))
    }

    /// Find the first match. No match is an empty result, not an error.
    pub fn find_one(&self, filter: &Document, options: FindOneOptions) -> Result<SingleResult> {
        debug!("find_one on {}: {}", self.name, filter);
        match self.store.find_one(filter, &options) {
            Ok(raw) => Ok(SingleResult::new(Some(raw), self.config.clone())),
            Err(StoreError::NoDocuments) => Ok(SingleResult::new(None, self.config.clone())),
            Err(e) => Err(wrap("failed to find one", e)),
        }
    }

    /// Find the first match and decode it, or `None` when nothing matches.
    pub fn find_one_and_decode<T: DeserializeOwned>(&self, filter: &Document) -> Result<Option<T>> {
        self.find_one(filter, FindOneOptions::default())?.decode()
    }

    pub fn aggregate(&self, pipeline: &[Document], options: AggregateOptions) -> Result<Cursor<S::Cursor>> {
        debug!("aggregate on {}: {} stages", self.name, pipeline.len());
        let inner = self
            .store
            .aggregate(pipeline, &options)
            .map_err(|e| wrap("failed to aggregate", e))?;
        Ok(Cursor::new(inner, self.config.clone()))
    }

    /// Insert a document and return the hex form of its `ObjectId`.
    pub fn insert_one(&self, document: &Document, options: InsertOneOptions) -> Result<String> {
        debug!("insert_one on {}", self.name);
        let id = self
            .store
            .insert_one(document, &options)
            .map_err(|e| wrap("failed to insert", e))?;
        match id {
            Value::ObjectId(oid) => Ok(oid.to_hex()),
            other => {
                warn!("insert into {} returned a non-ObjectId id: {}", self.name, other);
                Err(Error::UnexpectedInsertedId(other.to_string()))
            }
        }
    }

    /// Map a record with [`to_document`] and insert it.
    pub fn insert_record(&self, record: &dyn Record, options: InsertOneOptions) -> Result<String> {
        let document = to_document(record)?;
        self.insert_one(&document, options)
    }
}

/// A cursor yielding JSON documents.
pub struct Cursor<C> {
    inner: C,
    config: TranscoderConfig,
    done: bool,
}

impl<C: RawCursor> Cursor<C> {
    fn new(inner: C, config: TranscoderConfig) -> Self {
        Self {
            inner,
            config,
            done: false,
        }
    }

    /// Move to the next document. Returns `false` once the cursor is exhausted.
    pub fn advance(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let more = self.inner.advance().map_err(|e| wrap("failed to advance cursor", e))?;
        self.done = !more;
        Ok(more)
    }

    /// JSON bytes of the current document.
    pub fn current(&self) -> Result<Vec<u8>> {
        Transcoder::with_config(self.inner.current(), self.config.clone()).transcode()
    }

    /// Decode the current document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.current()?)?)
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.inner.id()
    }

    pub fn close(&mut self) -> Result<()> {
        self.done = true;
        self.inner.close().map_err(|e| wrap("failed to close cursor", e))
    }
}

impl<C: RawCursor> Iterator for Cursor<C> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => Some(self.current()),
            Ok(false) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// The outcome of a single-document query.
#[derive(Debug, Clone)]
pub struct SingleResult {
    raw: Option<Vec<u8>>,
    config: TranscoderConfig,
}

impl SingleResult {
    fn new(raw: Option<Vec<u8>>, config: TranscoderConfig) -> Self {
        Self { raw, config }
    }

    /// Whether the query matched a document.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.raw.is_some()
    }

    /// JSON bytes of the matched document.
    pub fn decode_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.raw
            .as_deref()
            .map(|raw| Transcoder::with_config(raw, self.config.clone()).transcode())
            .transpose()
    }

    /// Decode the matched document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.decode_bytes()? {
            Some(json) => Ok(Some(serde_json::from_slice(&json)?)),
            None => Ok(None),
        }
    }
}
