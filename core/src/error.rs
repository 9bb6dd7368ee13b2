//! Error types for the exchange pipeline.
//!
//! # Design
//! Every step of an exchange returns `Result<_, ExchangeError>`. Strategy
//! failures keep their own enums (`EncodeError`, `DecodeError`) so callers can
//! match on them, and convert into `ExchangeError` with `?`. A type mismatch is
//! a `DecodeError` variant: the bytes were well-formed JSON, just not the shape
//! the caller asked for.

use std::fmt;
use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::types::ErrorResponse;

pub type Result<T, E = ExchangeError> = std::result::Result<T, E>;

/// Which side of the exchange a strategy lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("reader"),
            Direction::Write => f.write_str("writer"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize {kind}: {source}")]
    Serialize {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The strategy was handed a payload it never claimed.
    #[error("{kind} cannot be written as {content_type}")]
    Unsupported {
        kind: &'static str,
        content_type: String,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty body where {expected} was expected")]
    EmptyBody { expected: &'static str },

    #[error("malformed body for {expected}: {source}")]
    Malformed {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("type mismatch: expected {expected}, {detail}")]
    TypeMismatch {
        expected: &'static str,
        detail: String,
    },

    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("no decoder registered for {expected}")]
    Unsupported { expected: &'static str },
}

impl DecodeError {
    /// Classify a `serde_json` failure: well-formed input of the wrong shape
    /// is a type mismatch, anything else is malformed.
    pub fn from_json(expected: &'static str, err: serde_json::Error) -> Self {
        if err.is_data() {
            DecodeError::TypeMismatch {
                expected,
                detail: err.to_string(),
            }
        } else {
            DecodeError::Malformed {
                expected,
                source: err,
            }
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, DecodeError::TypeMismatch { .. })
    }
}

/// Errors surfaced by one exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// No registered strategy accepted the (kind, content type) pair.
    #[error("no {direction} strategy for {kind} as {}", content_type.as_deref().unwrap_or("<none>"))]
    NoStrategy {
        direction: Direction,
        kind: &'static str,
        content_type: Option<String>,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body_snippet}")]
    Http {
        status: u16,
        error: Option<ErrorResponse>,
        body_snippet: String,
    },
}

impl ExchangeError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ExchangeError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Truncate a body to `limit` characters for error messages.
pub fn snippet(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let mut out = s.chars().take(limit).collect::<String>();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_is_malformed() {
        let err = serde_json::from_str::<ErrorResponse>("{not json").unwrap_err();
        let decode = DecodeError::from_json("ErrorResponse", err);
        assert!(matches!(decode, DecodeError::Malformed { .. }));
    }

    #[test]
    fn data_error_is_type_mismatch() {
        let err = serde_json::from_str::<ErrorResponse>(r#"{"status":"x"}"#).unwrap_err();
        let decode = DecodeError::from_json("ErrorResponse", err);
        assert!(decode.is_type_mismatch());
    }

    #[test]
    fn no_strategy_display() {
        let err = ExchangeError::NoStrategy {
            direction: Direction::Write,
            kind: "alloc::string::String",
            content_type: Some("application/json".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "no writer strategy for alloc::string::String as application/json"
        );
    }

    #[test]
    fn no_strategy_display_without_content_type() {
        let err = ExchangeError::NoStrategy {
            direction: Direction::Read,
            kind: "()",
            content_type: None,
        };
        assert!(err.to_string().ends_with("as <none>"));
    }

    #[test]
    fn decode_error_converts_transparently() {
        let err: ExchangeError = DecodeError::EmptyBody { expected: "Message" }.into();
        assert_eq!(err.to_string(), "empty body where Message was expected");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("ééééé", 2), "éé…");
    }
}
