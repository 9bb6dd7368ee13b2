//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values, hands them to a [`Transport`](crate::transport::Transport) and
//! decodes the returned `HttpResponse`, but never opens a socket itself.
//!
//! The request is "live" while an exchange filter runs: header edits made by
//! `before_send` are what the transport puts on the wire. The response is
//! split into a `ResponseHead` and a `Body` so that `after_receive` can look
//! at (and edit) the head without being able to consume the body.

use std::fmt;
use std::io::{self, Read};
use std::time::Duration;

use crate::media::TEXT_PLAIN;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const USER_AGENT: &str = "User-Agent";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized request payload labelled with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RequestBody {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Set a header, replacing any existing value under the same name
    /// (names compare case-insensitively).
    pub fn header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
        self
    }

    /// Remove every header with the given name. Returns whether any was present.
    pub fn remove_header(&mut self, name: &str) -> bool {
        let before = self.headers.len();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.len() != before
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Replace the body with the UTF-8 bytes of `source`, keeping the media
    /// type of the current body (or the `Content-Type` header) if there is one.
    pub fn send_string(&mut self, source: impl Into<String>) -> &mut Self {
        let content_type = self
            .body
            .as_ref()
            .map(|b| b.content_type.clone())
            .or_else(|| self.header_value(CONTENT_TYPE).map(str::to_string))
            .unwrap_or_else(|| format!("{TEXT_PLAIN}; charset=utf-8"));
        self.body = Some(RequestBody::new(content_type, source.into().into_bytes()));
        self
    }
}

/// Status line and headers of a response, available before the body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Response body, either already buffered or still behind a reader.
pub enum Body {
    Buffered(Vec<u8>),
    Reader(Box<dyn Read + Send>),
}

impl Body {
    /// Read the whole body into memory.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Body::Buffered(bytes) => Ok(bytes),
            Body::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Body::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Buffered(bytes)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Buffered(text.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Buffered(text.into_bytes())
    }
}

/// An HTTP response described as plain data.
///
/// Built by the transport. The body can be taken exactly once, by value.
#[derive(Debug)]
pub struct HttpResponse {
    pub head: ResponseHead,
    pub body: Body,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            head: ResponseHead::new(status),
            body: body.into(),
        }
    }

    /// Attach a header, builder style. Used by transports and tests.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.head.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn status(&self) -> u16 {
        self.head.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.head.content_type()
    }

    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        self.body.into_bytes()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
