//! Hooks over the live request and response of one exchange.
//!
//! # Design
//! An `ExchangeFilter` is a pair of functions the exchange runner calls at
//! fixed points: `before_send` after the body has been written and before the
//! request goes to the transport, `after_receive` once the status and headers
//! are known and before the body is decoded. The response hook only sees the
//! `ResponseHead`, so it cannot consume the body.
//!
//! Both hooks are always present; the builder starts from no-ops. A built
//! filter is immutable and cheap to clone, and can be shared across threads.

use std::fmt;
use std::sync::Arc;

use crate::http::{HttpRequest, ResponseHead, CONTENT_TYPE};

type RequestHook = dyn Fn(&mut HttpRequest) + Send + Sync;
type ResponseHook = dyn Fn(&mut ResponseHead) + Send + Sync;

#[derive(Clone)]
pub struct ExchangeFilter {
    request_filter: Arc<RequestHook>,
    response_filter: Arc<ResponseHook>,
}

impl ExchangeFilter {
    pub fn builder() -> ExchangeFilterBuilder {
        ExchangeFilterBuilder::new()
    }

    /// A filter that touches nothing.
    pub fn identity() -> Self {
        Self::builder().build()
    }

    /// A filter that sets the `Content-Type` request header to `content_type`.
    pub fn request_content_type(content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        Self::builder()
            .request_filter(move |req| {
                req.header(CONTENT_TYPE, content_type.as_str());
            })
            .build()
    }

    pub fn before_send(&self, request: &mut HttpRequest) {
        (self.request_filter)(request);
    }

    pub fn after_receive(&self, head: &mut ResponseHead) {
        (self.response_filter)(head);
    }
}

impl Default for ExchangeFilter {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for ExchangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeFilter").finish_non_exhaustive()
    }
}

/// Builder for [`ExchangeFilter`]. Each setter replaces the current hook.
pub struct ExchangeFilterBuilder {
    request_filter: Arc<RequestHook>,
    response_filter: Arc<ResponseHook>,
}

impl ExchangeFilterBuilder {
    fn new() -> Self {
        Self {
            request_filter: Arc::new(|_: &mut HttpRequest| {}),
            response_filter: Arc::new(|_: &mut ResponseHead| {}),
        }
    }

    pub fn request_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&mut HttpRequest) + Send + Sync + 'static,
    {
        self.request_filter = Arc::new(filter);
        self
    }

    pub fn response_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&mut ResponseHead) + Send + Sync + 'static,
    {
        self.response_filter = Arc::new(filter);
        self
    }

    pub fn build(self) -> ExchangeFilter {
        ExchangeFilter {
            request_filter: self.request_filter,
            response_filter: self.response_filter,
        }
    }
}

impl fmt::Debug for ExchangeFilterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeFilterBuilder").finish_non_exhaustive()
    }
}
