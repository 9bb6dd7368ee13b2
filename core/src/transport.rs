//! The seam between the exchange runner and the network.
//!
//! The core never performs I/O itself. A host supplies a `Transport` that
//! puts an `HttpRequest` on the wire and hands back the `HttpResponse`; the
//! runner owns everything before and after that call. Dropping the returned
//! future cancels the exchange and releases the request body.

use std::future::Future;
use std::io;

use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations honor `request.timeout` when set and report transport
/// failures (connect, TLS, timeout, truncated read) as `io::Error`. Non-2xx
/// statuses are not errors at this layer.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = io::Result<HttpResponse>> + Send;
}
