//! Codec trait and the serde_json-backed implementation.
//!
//! # Design
//! Strategies only need four capabilities from a codec: whether a kind can be
//! encoded, whether it can be decoded, and the two operations themselves. The
//! JSON codec answers the capability questions from a registry keyed by
//! `TypeId`, filled in once while the client is assembled. Decoders are plain
//! function pointers monomorphized per registered type, so the codec stays
//! `Send + Sync` and cheap to share behind an `Arc`.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DecodeError, EncodeError};
use crate::kind::Kind;
use crate::strategy::{Decoded, Payload};
use crate::types::ErrorResponse;

/// Capabilities a strategy needs from a serialization library.
pub trait Codec: Send + Sync {
    fn can_encode(&self, kind: &Kind) -> bool;

    fn can_decode(&self, kind: &Kind) -> bool;

    fn encode(&self, value: &dyn Payload) -> Result<Vec<u8>, EncodeError>;

    fn decode(&self, bytes: &[u8], kind: &Kind) -> Result<Decoded, DecodeError>;
}

type DecodeFn = fn(&[u8]) -> serde_json::Result<Decoded>;

fn decode_as<T: DeserializeOwned + Send + 'static>(bytes: &[u8]) -> serde_json::Result<Decoded> {
    serde_json::from_slice::<T>(bytes).map(|value| Box::new(value) as Decoded)
}

/// JSON codec using serde_json, with an explicit type registry.
///
/// `serde_json::Value`, `()` and [`ErrorResponse`] are registered by
/// [`JsonCodec::new`]; everything else must be registered before use.
#[derive(Clone)]
pub struct JsonCodec {
    encoders: HashSet<TypeId>,
    decoders: HashMap<TypeId, (&'static str, DecodeFn)>,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self {
            encoders: HashSet::new(),
            decoders: HashMap::new(),
        }
        .register::<serde_json::Value>()
        .register::<()>()
        .register::<ErrorResponse>()
    }

    /// Register `T` for both directions.
    pub fn register<T>(self) -> Self
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.register_encoder::<T>().register_decoder::<T>()
    }

    pub fn register_encoder<T: Serialize + 'static>(mut self) -> Self {
        self.encoders.insert(TypeId::of::<T>());
        self
    }

    pub fn register_decoder<T: DeserializeOwned + Send + 'static>(mut self) -> Self {
        self.decoders
            .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), decode_as::<T> as DecodeFn));
        self
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonCodec {
    fn can_encode(&self, kind: &Kind) -> bool {
        self.encoders.contains(&kind.id())
    }

    fn can_decode(&self, kind: &Kind) -> bool {
        self.decoders.contains_key(&kind.id())
    }

    fn encode(&self, value: &dyn Payload) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        value
            .write_json(&mut out)
            .map_err(|source| EncodeError::Serialize {
                kind: value.kind().name(),
                source,
            })?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8], kind: &Kind) -> Result<Decoded, DecodeError> {
        let (_, decode) = self
            .decoders
            .get(&kind.id())
            .ok_or(DecodeError::Unsupported {
                expected: kind.name(),
            })?;
        decode(bytes).map_err(|err| DecodeError::from_json(kind.name(), err))
    }
}

impl fmt::Debug for JsonCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decodes: Vec<&str> = self.decoders.values().map(|(name, _)| *name).collect();
        decodes.sort_unstable();
        f.debug_struct("JsonCodec")
            .field("encoders", &self.encoders.len())
            .field("decoders", &decodes)
            .finish()
    }
}
