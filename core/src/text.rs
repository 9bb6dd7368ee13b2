//! Fallback strategies for raw text.
//!
//! A route that declares a string body or a string response gets the bytes
//! verbatim, whatever the content type says. These are registered after the
//! JSON strategies, which refuse textual kinds.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{DecodeError, EncodeError, Result};
use crate::http::{HttpResponse, RequestBody};
use crate::kind::Kind;
use crate::strategy::{Decoded, Payload, ReaderStrategy, WriterStrategy};

/// Reads any response body as a `String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReaderStrategy;

impl ReaderStrategy for TextReaderStrategy {
    fn can_read(&self, kind: Option<&Kind>, content_type: Option<&str>) -> bool {
        content_type.is_some() && kind.is_some_and(|k| *k == Kind::of::<String>())
    }

    fn read(&self, response: HttpResponse, _kind: &Kind) -> Result<Decoded> {
        let bytes = response.into_bytes()?;
        let text = String::from_utf8(bytes).map_err(DecodeError::from)?;
        Ok(Box::new(text))
    }

    fn name(&self) -> &'static str {
        "text-reader"
    }
}

/// Writes string payloads verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriterStrategy;

impl WriterStrategy for TextWriterStrategy {
    fn can_write(&self, kind: Option<&Kind>, content_type: Option<&str>) -> bool {
        content_type.is_some() && kind.is_some_and(Kind::is_text)
    }

    fn write(&self, content_type: &str, body: &dyn Payload) -> Result<RequestBody> {
        let text = as_str(body).ok_or_else(|| EncodeError::Unsupported {
            kind: body.kind().name(),
            content_type: content_type.to_string(),
        })?;
        Ok(RequestBody::new(content_type, text.as_bytes().to_vec()))
    }

    fn name(&self) -> &'static str {
        "text-writer"
    }
}

fn as_str(body: &dyn Payload) -> Option<&str> {
    let any = body.as_any();
    any.downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| any.downcast_ref::<&'static str>().copied())
        .or_else(|| any.downcast_ref::<Box<str>>().map(|s| &**s))
        .or_else(|| any.downcast_ref::<Cow<'static, str>>().map(|s| s.as_ref()))
        .or_else(|| any.downcast_ref::<Arc<str>>().map(|s| &**s))
}
