//! Exchange runner for the Discord REST API.
//!
//! # Design
//! `RestClient` holds its configuration, a transport and the strategy
//! registry, and carries no mutable state between exchanges. One call to
//! [`RestClient::exchange`] runs the steps in a fixed order:
//!
//! 1. select a writer and encode the body (if any), setting `Content-Type`
//! 2. `before_send` on the live request
//! 3. transport round-trip
//! 4. `after_receive` on the response head
//! 5. map non-2xx statuses to [`ExchangeError::Http`]
//! 6. select a reader and decode the body as the requested type
//!
//! No step starts before the previous one finished, and a failing step ends
//! the exchange.

use std::any::Any;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{snippet, ExchangeError, Result};
use crate::filter::ExchangeFilter;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, CONTENT_TYPE, USER_AGENT};
use crate::kind::Kind;
use crate::media::APPLICATION_JSON;
use crate::strategy::{downcast, ExchangeStrategies, Payload};
use crate::transport::Transport;
use crate::types::ErrorResponse;

const ERROR_SNIPPET_LEN: usize = 200;

/// Everything the caller decides about one exchange.
#[derive(Debug)]
pub struct ExchangeRequest<'a> {
    method: HttpMethod,
    path: String,
    body: Option<(&'a dyn Payload, Kind)>,
    content_type: String,
    filter: ExchangeFilter,
}

impl<'a> ExchangeRequest<'a> {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            content_type: APPLICATION_JSON.to_string(),
            filter: ExchangeFilter::identity(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a payload whose static type is known.
    pub fn body<P: Payload>(mut self, body: &'a P) -> Self {
        let payload: &'a dyn Payload = body;
        self.body = Some((payload, Kind::of::<P>()));
        self
    }

    /// Attach a payload whose static type has been erased.
    pub fn erased_body(mut self, body: &'a dyn Payload) -> Self {
        self.body = Some((body, Kind::any()));
        self
    }

    /// Media type used to select the writer. Defaults to `application/json`.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn filter(mut self, filter: ExchangeFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Stateless client for the Discord REST API over a pluggable transport.
#[derive(Debug)]
pub struct RestClient<T> {
    config: ClientConfig,
    transport: T,
    strategies: ExchangeStrategies,
}

impl<T: Transport> RestClient<T> {
    pub fn new(config: ClientConfig, transport: T, strategies: ExchangeStrategies) -> Self {
        Self {
            config,
            transport,
            strategies,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn strategies(&self) -> &ExchangeStrategies {
        &self.strategies
    }

    /// Run one exchange and decode the response as `R`.
    ///
    /// A response with no content type is accepted as `()` when `R` is `()`,
    /// which covers `204 No Content`.
    pub async fn exchange<R: Any>(&self, request: ExchangeRequest<'_>) -> Result<R> {
        let ExchangeRequest {
            method,
            path,
            body,
            content_type,
            filter,
        } = request;

        let base_url = self.config.base_url.trim_end_matches('/');
        let mut http = HttpRequest::new(method, format!("{base_url}{path}"));
        http.header(USER_AGENT, self.config.user_agent.as_str());
        http.timeout = self.config.timeout();

        if let Some((payload, kind)) = body {
            let body = self.strategies.write(&kind, &content_type, payload)?;
            http.header(CONTENT_TYPE, body.content_type.as_str());
            http.body = Some(body);
        }

        filter.before_send(&mut http);
        debug!(method = %method, url = %http.url, "sending request");

        let HttpResponse { mut head, body } = self.transport.send(http).await?;
        filter.after_receive(&mut head);
        let response = HttpResponse { head, body };
        debug!(status = response.status(), content_type = ?response.content_type(), "received response");

        if !response.head.is_success() {
            return Err(self.status_error(response));
        }

        let kind = Kind::of::<R>();
        if kind.is_unit() && response.content_type().is_none() {
            response.into_bytes()?;
            return downcast(Box::new(()));
        }
        downcast(self.strategies.read(response, &kind)?)
    }

    /// Build the error for a non-2xx response, decoding the body as an
    /// [`ErrorResponse`] when a reader accepts it.
    fn status_error(&self, response: HttpResponse) -> ExchangeError {
        let status = response.status();
        let content_type = response.content_type().map(str::to_string);
        let bytes = match response.into_bytes() {
            Ok(bytes) => bytes,
            Err(err) => return err.into(),
        };

        let body_snippet = snippet(&String::from_utf8_lossy(&bytes), ERROR_SNIPPET_LEN);
        let error = content_type.and_then(|content_type| {
            let replay = HttpResponse::new(status, bytes).with_header(CONTENT_TYPE, content_type);
            self.strategies.read_as::<ErrorResponse>(replay).ok()
        });
        warn!(status, error = ?error, "request failed");

        ExchangeError::Http {
            status,
            error,
            body_snippet,
        }
    }
}
