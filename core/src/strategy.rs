//! Content negotiation: reader and writer strategies and their registry.
//!
//! # Design
//! A strategy answers two questions: "can you handle this kind under this
//! content type?" and, only after a yes, "do it". The predicate must be pure
//! so the registry can ask every strategy in turn without side effects.
//!
//! Strategies live behind `Arc<dyn _>` and are shared by every exchange of a
//! client, so payloads and decoded values cross the trait boundary type-erased:
//! outgoing values as `&dyn Payload`, incoming values as `Decoded`
//! (`Box<dyn Any + Send>`), downcast by the caller to the type it asked for.
//!
//! Selection walks the registry in registration order and takes the first
//! strategy whose predicate holds. A strategy that claims a pair and then fails
//! ends the exchange; there is no fall-through.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::codec::Codec;
use crate::error::{DecodeError, Direction, ExchangeError, Result};
use crate::http::{HttpResponse, RequestBody};
use crate::json::{JsonReaderStrategy, JsonWriterStrategy};
use crate::kind::Kind;
use crate::text::{TextReaderStrategy, TextWriterStrategy};

/// A decoded response value, downcast by the caller.
pub type Decoded = Box<dyn Any + Send>;

/// An outgoing value, erased so any writer strategy can be handed it.
///
/// Implemented for every `Serialize + Send + Sync + 'static` type.
pub trait Payload: Any + Send + Sync {
    fn kind(&self) -> Kind;

    fn as_any(&self) -> &dyn Any;

    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()>;
}

impl<T: Serialize + Send + Sync + 'static> Payload for T {
    fn kind(&self) -> Kind {
        Kind::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        serde_json::to_writer(out, self)
    }
}

impl fmt::Debug for dyn Payload + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({})", self.kind())
    }
}

/// Decodes response bodies.
pub trait ReaderStrategy: Send + Sync {
    /// Whether this strategy can decode a response of `kind` served as
    /// `content_type`. Either input absent means `false`.
    fn can_read(&self, kind: Option<&Kind>, content_type: Option<&str>) -> bool;

    /// Consume the response body and decode it as `kind`.
    fn read(&self, response: HttpResponse, kind: &Kind) -> Result<Decoded>;

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Encodes request bodies.
pub trait WriterStrategy: Send + Sync {
    /// Whether this strategy can encode a payload of `kind` as
    /// `content_type`. Either input absent means `false`.
    fn can_write(&self, kind: Option<&Kind>, content_type: Option<&str>) -> bool;

    /// Serialize `body` into a request body labelled `content_type`.
    ///
    /// `content_type` must be the value `can_write` accepted.
    fn write(&self, content_type: &str, body: &dyn Payload) -> Result<RequestBody>;

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Ordered set of strategies a client negotiates with.
#[derive(Clone, Default)]
pub struct ExchangeStrategies {
    writers: Vec<Arc<dyn WriterStrategy>>,
    readers: Vec<Arc<dyn ReaderStrategy>>,
}

impl ExchangeStrategies {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON strategies bound to `codec`, followed by the text fallbacks.
    pub fn json<C: Codec + 'static>(codec: Arc<C>) -> Self {
        Self::new()
            .with_writer(JsonWriterStrategy::new(Arc::clone(&codec)))
            .with_writer(TextWriterStrategy)
            .with_reader(JsonReaderStrategy::new(codec))
            .with_reader(TextReaderStrategy)
    }

    pub fn with_writer(mut self, writer: impl WriterStrategy + 'static) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    pub fn with_reader(mut self, reader: impl ReaderStrategy + 'static) -> Self {
        self.readers.push(Arc::new(reader));
        self
    }

    pub fn writers(&self) -> impl Iterator<Item = &dyn WriterStrategy> {
        self.writers.iter().map(|w| w.as_ref())
    }

    pub fn readers(&self) -> impl Iterator<Item = &dyn ReaderStrategy> {
        self.readers.iter().map(|r| r.as_ref())
    }

    /// First writer, in registration order, that accepts the pair.
    pub fn writer_for(
        &self,
        kind: Option<&Kind>,
        content_type: Option<&str>,
    ) -> Option<&dyn WriterStrategy> {
        self.writers().find(|w| w.can_write(kind, content_type))
    }

    /// First reader, in registration order, that accepts the pair.
    pub fn reader_for(
        &self,
        kind: Option<&Kind>,
        content_type: Option<&str>,
    ) -> Option<&dyn ReaderStrategy> {
        self.readers().find(|r| r.can_read(kind, content_type))
    }

    /// Select a writer for a payload of static kind `kind` and encode it.
    pub fn write(&self, kind: &Kind, content_type: &str, body: &dyn Payload) -> Result<RequestBody> {
        let writer = self
            .writer_for(Some(kind), Some(content_type))
            .ok_or_else(|| ExchangeError::NoStrategy {
                direction: Direction::Write,
                kind: kind.name(),
                content_type: Some(content_type.to_string()),
            })?;
        debug!(writer = writer.name(), kind = %kind, content_type, "selected writer");
        writer.write(content_type, body)
    }

    /// Select a reader for the response and decode it as `kind`.
    pub fn read(&self, response: HttpResponse, kind: &Kind) -> Result<Decoded> {
        let content_type = response.content_type().map(str::to_string);
        let reader = self
            .reader_for(Some(kind), content_type.as_deref())
            .ok_or_else(|| ExchangeError::NoStrategy {
                direction: Direction::Read,
                kind: kind.name(),
                content_type: content_type.clone(),
            })?;
        debug!(reader = reader.name(), kind = %kind, content_type = ?content_type, "selected reader");
        reader.read(response, kind)
    }

    /// Select a reader and decode the response as `R`.
    pub fn read_as<R: Any>(&self, response: HttpResponse) -> Result<R> {
        downcast(self.read(response, &Kind::of::<R>())?)
    }
}

impl fmt::Debug for ExchangeStrategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeStrategies")
            .field("writers", &self.writers().map(|w| w.name()).collect::<Vec<_>>())
            .field("readers", &self.readers().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Recover the concrete value a reader produced.
pub fn downcast<R: Any>(decoded: Decoded) -> Result<R> {
    decoded.downcast::<R>().map(|value| *value).map_err(|_| {
        DecodeError::TypeMismatch {
            expected: type_name::<R>(),
            detail: "reader produced a value of another type".to_string(),
        }
        .into()
    })
}
