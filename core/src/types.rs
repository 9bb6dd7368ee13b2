//! Discord API DTOs.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates.

use serde::{Deserialize, Serialize};

/// Body of a 4xx/5xx response from the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: i32,
    pub error: String,
    pub message: String,
}

/// A message posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    #[serde(default)]
    pub tts: bool,
}

/// Request payload for posting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
}

/// Response of `GET /gateway`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub url: String,
}
