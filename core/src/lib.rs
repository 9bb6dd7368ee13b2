//! Content negotiation and exchange filters for a Discord REST client.
//!
//! # Overview
//! Outgoing payloads are encoded by the first registered [`WriterStrategy`]
//! that accepts their kind and content type; responses are decoded by the
//! first [`ReaderStrategy`] that accepts the requested kind and the response
//! content type. An [`ExchangeFilter`] can observe and edit the live request
//! just before it is sent and the response head just after it arrives.
//!
//! # Design
//! - The core never touches the network: a [`Transport`] supplied by the host
//!   performs the round-trip (host-does-IO).
//! - Strategies are stateless and shared behind `Arc`; the JSON ones hold only
//!   an `Arc` to an immutable [`JsonCodec`].
//! - Every failure is an [`ExchangeError`]; strategies never recover locally.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod json;
pub mod kind;
pub mod media;
pub mod strategy;
pub mod text;
pub mod transport;
pub mod types;

pub use client::{ExchangeRequest, RestClient};
pub use codec::{Codec, JsonCodec};
pub use config::ClientConfig;
pub use error::{DecodeError, Direction, EncodeError, ExchangeError, Result};
pub use filter::{ExchangeFilter, ExchangeFilterBuilder};
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseHead};
pub use json::{JsonReaderStrategy, JsonWriterStrategy};
pub use kind::{Kind, Shape};
pub use strategy::{Decoded, ExchangeStrategies, Payload, ReaderStrategy, WriterStrategy};
pub use text::{TextReaderStrategy, TextWriterStrategy};
pub use transport::Transport;
pub use types::{CreateMessage, ErrorResponse, GatewayInfo, Message};
