//! JSON reader and writer strategies.
//!
//! Both claim `application/json*` content types (prefix match on the media
//! type, so `application/json; charset=utf-8` and
//! `application/json-patch+json` are accepted) and refuse textual kinds, which
//! belong to the text strategies: a raw `"foo"` must not be read or written as
//! a JSON string literal.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::codec::{Codec, JsonCodec};
use crate::error::{DecodeError, Result};
use crate::http::{HttpResponse, RequestBody};
use crate::kind::Kind;
use crate::media;
use crate::strategy::{Decoded, Payload, ReaderStrategy, WriterStrategy};

/// Decodes JSON response bodies with a shared codec.
pub struct JsonReaderStrategy<C = JsonCodec> {
    codec: Arc<C>,
}

impl<C: Codec> JsonReaderStrategy<C> {
    pub fn new(codec: Arc<C>) -> Self {
        Self { codec }
    }
}

impl<C: Codec> ReaderStrategy for JsonReaderStrategy<C> {
    fn can_read(&self, kind: Option<&Kind>, content_type: Option<&str>) -> bool {
        let (Some(kind), Some(content_type)) = (kind, content_type) else {
            return false;
        };
        if !media::is_json(content_type) {
            return false;
        }
        // Text kinds are read verbatim by the fallback reader.
        !kind.is_text() && self.codec.can_decode(kind)
    }

    fn read(&self, response: HttpResponse, kind: &Kind) -> Result<Decoded> {
        let bytes = response.into_bytes()?;
        trace!(kind = %kind, len = bytes.len(), "decoding JSON body");
        if bytes.iter().all(u8::is_ascii_whitespace) {
            if kind.is_unit() {
                return Ok(Box::new(()));
            }
            return Err(DecodeError::EmptyBody {
                expected: kind.name(),
            }
            .into());
        }
        Ok(self.codec.decode(&bytes, kind)?)
    }

    fn name(&self) -> &'static str {
        "json-reader"
    }
}

impl<C> Clone for JsonReaderStrategy<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for JsonReaderStrategy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonReaderStrategy")
            .field("codec", &self.codec)
            .finish()
    }
}

/// Encodes request payloads as JSON with a shared codec.
pub struct JsonWriterStrategy<C = JsonCodec> {
    codec: Arc<C>,
}

impl<C: Codec> JsonWriterStrategy<C> {
    pub fn new(codec: Arc<C>) -> Self {
        Self { codec }
    }
}

impl<C: Codec> WriterStrategy for JsonWriterStrategy<C> {
    fn can_write(&self, kind: Option<&Kind>, content_type: Option<&str>) -> bool {
        let (Some(kind), Some(content_type)) = (kind, content_type) else {
            return false;
        };
        if !media::is_json(content_type) {
            return false;
        }
        // Statically erased payloads are left to the codec at write time.
        if kind.is_any() {
            return true;
        }
        !kind.is_text() && self.codec.can_encode(kind)
    }

    fn write(&self, content_type: &str, body: &dyn Payload) -> Result<RequestBody> {
        let bytes = self.codec.encode(body)?;
        trace!(kind = %body.kind(), len = bytes.len(), "encoded JSON body");
        Ok(RequestBody::new(content_type, bytes))
    }

    fn name(&self) -> &'static str {
        "json-writer"
    }
}

impl<C> Clone for JsonWriterStrategy<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for JsonWriterStrategy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonWriterStrategy")
            .field("codec", &self.codec)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::{Deserialize, Serialize};

    use crate::error::{EncodeError, ExchangeError};
    use crate::http::{Body, CONTENT_TYPE};
    use crate::strategy::downcast;
    use crate::types::ErrorResponse;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Identify {
        op: u8,
        d: String,
    }

    fn codec() -> Arc<JsonCodec> {
        Arc::new(JsonCodec::new().register::<Identify>())
    }

    fn json_response(body: &str) -> HttpResponse {
        HttpResponse::new(200, body).with_header(CONTENT_TYPE, "application/json")
    }

    /// Codec that counts capability queries and refuses to encode.
    #[derive(Default)]
    struct CountingCodec {
        queries: AtomicUsize,
    }

    impl Codec for CountingCodec {
        fn can_encode(&self, _kind: &Kind) -> bool {
            self.queries.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn can_decode(&self, _kind: &Kind) -> bool {
            self.queries.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn encode(&self, value: &dyn Payload) -> std::result::Result<Vec<u8>, EncodeError> {
            Err(EncodeError::Unsupported {
                kind: value.kind().name(),
                content_type: "application/json".to_string(),
            })
        }

        fn decode(&self, _bytes: &[u8], kind: &Kind) -> std::result::Result<Decoded, DecodeError> {
            Err(DecodeError::Unsupported {
                expected: kind.name(),
            })
        }
    }

    #[test]
    fn reader_refuses_absent_inputs() {
        let reader = JsonReaderStrategy::new(codec());
        let kind = Kind::of::<ErrorResponse>();
        assert!(!reader.can_read(None, Some("application/json")));
        assert!(!reader.can_read(Some(&kind), None));
        assert!(!reader.can_read(None, None));
    }

    #[test]
    fn reader_content_type_rules() {
        let reader = JsonReaderStrategy::new(codec());
        let kind = Kind::of::<ErrorResponse>();
        assert!(reader.can_read(Some(&kind), Some("application/json")));
        assert!(reader.can_read(Some(&kind), Some("application/json; charset=utf-8")));
        assert!(reader.can_read(Some(&kind), Some("application/json-patch+json")));
        assert!(!reader.can_read(Some(&kind), Some("text/plain")));
    }

    #[test]
    fn reader_refuses_text_kinds() {
        let reader = JsonReaderStrategy::new(codec());
        assert!(!reader.can_read(Some(&Kind::of::<String>()), Some("application/json")));
        assert!(!reader.can_read(Some(&Kind::of::<&'static str>()), Some("application/json")));
    }

    #[test]
    fn reader_defers_to_codec_registry() {
        let reader = JsonReaderStrategy::new(Arc::new(JsonCodec::new()));
        assert!(!reader.can_read(Some(&Kind::of::<Identify>()), Some("application/json")));
    }

    #[test]
    fn reader_decodes_error_response() {
        let reader = JsonReaderStrategy::new(codec());
        let kind = Kind::of::<ErrorResponse>();
        let decoded = reader
            .read(
                json_response(r#"{"status":401,"error":"Unauthorized","message":"401: Unauthorized"}"#),
                &kind,
            )
            .unwrap();
        let error: ErrorResponse = downcast(decoded).unwrap();
        assert_eq!(
            error,
            ErrorResponse {
                status: 401,
                error: "Unauthorized".to_string(),
                message: "401: Unauthorized".to_string(),
            }
        );
    }

    #[test]
    fn reader_empty_body_is_decode_error() {
        let reader = JsonReaderStrategy::new(codec());
        let err = reader
            .read(json_response(""), &Kind::of::<ErrorResponse>())
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Decode(DecodeError::EmptyBody { .. })
        ));
    }

    #[test]
    fn reader_empty_body_is_unit() {
        let reader = JsonReaderStrategy::new(codec());
        let decoded = reader.read(json_response(" "), &Kind::of::<()>()).unwrap();
        downcast::<()>(decoded).unwrap();
    }

    #[test]
    fn reader_malformed_body() {
        let reader = JsonReaderStrategy::new(codec());
        let err = reader
            .read(json_response("{\"op\":"), &Kind::of::<Identify>())
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Decode(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn reader_wrong_shape_is_type_mismatch() {
        let reader = JsonReaderStrategy::new(codec());
        let err = reader
            .read(json_response(r#"{"op":"two","d":"x"}"#), &Kind::of::<Identify>())
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Decode(ref e) if e.is_type_mismatch()));
    }

    #[test]
    fn reader_body_failure_is_io_error() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }
        let reader = JsonReaderStrategy::new(codec());
        let response = HttpResponse::new(200, Body::Reader(Box::new(Broken)))
            .with_header(CONTENT_TYPE, "application/json");
        let err = reader.read(response, &Kind::of::<Identify>()).unwrap_err();
        assert!(matches!(err, ExchangeError::Io(_)));
    }

    #[test]
    fn writer_refuses_absent_inputs() {
        let writer = JsonWriterStrategy::new(codec());
        let kind = Kind::of::<Identify>();
        assert!(!writer.can_write(None, Some("application/json")));
        assert!(!writer.can_write(Some(&kind), None));
    }

    #[test]
    fn writer_claims_registered_kinds() {
        let writer = JsonWriterStrategy::new(codec());
        let kind = Kind::of::<Identify>();
        assert!(writer.can_write(Some(&kind), Some("application/json")));
        assert!(writer.can_write(Some(&kind), Some("application/json; charset=utf-8")));
        assert!(!writer.can_write(Some(&kind), Some("multipart/form-data")));
    }

    #[test]
    fn writer_refuses_strings() {
        let writer = JsonWriterStrategy::new(codec());
        assert!(!writer.can_write(Some(&Kind::of::<String>()), Some("application/json")));
    }

    #[test]
    fn writer_accepts_erased_kind_without_asking_codec() {
        let counting = Arc::new(CountingCodec::default());
        let writer = JsonWriterStrategy::new(Arc::clone(&counting));
        assert!(writer.can_write(Some(&Kind::any()), Some("application/json")));
        assert_eq!(counting.queries.load(Ordering::SeqCst), 0);

        let unregistered = JsonWriterStrategy::new(Arc::new(JsonCodec::new()));
        assert!(unregistered.can_write(Some(&Kind::any()), Some("application/json")));
    }

    #[test]
    fn writer_asks_codec_about_json_values() {
        /// Encodes nothing but `Identify`.
        struct IdentifyOnly;

        impl Codec for IdentifyOnly {
            fn can_encode(&self, kind: &Kind) -> bool {
                *kind == Kind::of::<Identify>()
            }

            fn can_decode(&self, _kind: &Kind) -> bool {
                false
            }

            fn encode(&self, value: &dyn Payload) -> std::result::Result<Vec<u8>, EncodeError> {
                JsonCodec::new().register::<Identify>().encode(value)
            }

            fn decode(&self, _bytes: &[u8], kind: &Kind) -> std::result::Result<Decoded, DecodeError> {
                Err(DecodeError::Unsupported {
                    expected: kind.name(),
                })
            }
        }

        let writer = JsonWriterStrategy::new(Arc::new(IdentifyOnly));
        let value = Kind::of::<serde_json::Value>();
        assert!(!writer.can_write(Some(&value), Some("application/json")));
        assert!(writer.can_write(Some(&Kind::of::<Identify>()), Some("application/json")));
        assert!(writer.can_write(Some(&Kind::any()), Some("application/json")));

        let registered = JsonWriterStrategy::new(Arc::new(JsonCodec::new()));
        assert!(registered.can_write(Some(&value), Some("application/json")));
    }

    #[test]
    fn writer_produces_json_with_given_content_type() {
        let writer = JsonWriterStrategy::new(codec());
        let body = writer
            .write(
                "application/json",
                &Identify {
                    op: 2,
                    d: "foo".to_string(),
                },
            )
            .unwrap();
        assert_eq!(body.content_type, "application/json");
        let value: serde_json::Value = serde_json::from_slice(&body.bytes).unwrap();
        assert_eq!(value, serde_json::json!({"op": 2, "d": "foo"}));
    }

    #[test]
    fn writer_surfaces_codec_failure() {
        let writer = JsonWriterStrategy::new(Arc::new(CountingCodec::default()));
        let err = writer.write("application/json", &1u8).unwrap_err();
        assert!(matches!(err, ExchangeError::Encode(_)));
    }

    #[test]
    fn predicates_are_idempotent() {
        let counting = Arc::new(CountingCodec::default());
        let reader = JsonReaderStrategy::new(Arc::clone(&counting));
        let kind = Kind::of::<Identify>();
        let first = reader.can_read(Some(&kind), Some("application/json"));
        for _ in 0..10 {
            assert_eq!(reader.can_read(Some(&kind), Some("application/json")), first);
        }
        // Refused content types never reach the codec.
        let before = counting.queries.load(Ordering::SeqCst);
        assert!(!reader.can_read(Some(&kind), Some("text/html")));
        assert_eq!(counting.queries.load(Ordering::SeqCst), before);
    }
}
