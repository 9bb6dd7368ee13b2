use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub tts: bool,
}

#[derive(Deserialize)]
pub struct CreateMessage {
    pub content: String,
    #[serde(default)]
    pub tts: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg";

/// Messages keyed by snowflake, plus the next snowflake to hand out.
#[derive(Clone)]
pub struct Db {
    messages: Arc<RwLock<BTreeMap<u64, Message>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for Db {
    fn default() -> Self {
        Self {
            messages: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1_000)),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode) -> ApiError {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    (
        status,
        Json(ErrorResponse {
            status: status.as_u16(),
            error: reason.to_string(),
            message: format!("{}: {reason}", status.as_u16()),
        }),
    )
}

pub fn app() -> Router {
    Router::new()
        .route("/gateway", get(gateway))
        .route("/users/@me", get(current_user))
        .route("/health", get(health))
        .route("/echo", post(echo))
        .route(
            "/channels/{channel_id}/messages",
            get(list_messages).post(create_message),
        )
        .route(
            "/channels/{channel_id}/messages/{message_id}",
            get(get_message).delete(delete_message),
        )
        .with_state(Db::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn gateway() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "url": GATEWAY_URL }))
}

async fn health() -> &'static str {
    "ok"
}

async fn current_user(headers: HeaderMap) -> Result<Json<User>, ApiError> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bot "));
    if !authorized {
        debug!("rejected request without a bot token");
        return Err(api_error(StatusCode::UNAUTHORIZED));
    }
    Ok(Json(User {
        id: "1".to_string(),
        username: "mock-bot".to_string(),
    }))
}

/// Answer with the request body and its `Content-Type`, unchanged.
async fn echo(headers: HeaderMap, body: Bytes) -> (HeaderMap, Bytes) {
    let mut out = HeaderMap::new();
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        out.insert(header::CONTENT_TYPE, content_type.clone());
    }
    (out, body)
}

async fn list_messages(State(db): State<Db>, Path(channel_id): Path<u64>) -> Json<Vec<Message>> {
    let channel_id = channel_id.to_string();
    let messages = db.messages.read().await;
    Json(
        messages
            .values()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect(),
    )
}

async fn create_message(
    State(db): State<Db>,
    Path(channel_id): Path<u64>,
    Json(input): Json<CreateMessage>,
) -> Result<Json<Message>, ApiError> {
    if input.content.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST));
    }
    let id = db.next_id.fetch_add(1, Ordering::SeqCst);
    let message = Message {
        id: id.to_string(),
        channel_id: channel_id.to_string(),
        content: input.content,
        tts: input.tts,
    };
    db.messages.write().await.insert(id, message.clone());
    debug!(id, channel_id, "created message");
    Ok(Json(message))
}

async fn get_message(
    State(db): State<Db>,
    Path((channel_id, message_id)): Path<(u64, u64)>,
) -> Result<Json<Message>, ApiError> {
    let messages = db.messages.read().await;
    messages
        .get(&message_id)
        .filter(|m| m.channel_id == channel_id.to_string())
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND))
}

async fn delete_message(
    State(db): State<Db>,
    Path((channel_id, message_id)): Path<(u64, u64)>,
) -> Result<StatusCode, ApiError> {
    let mut messages = db.messages.write().await;
    match messages.get(&message_id) {
        Some(m) if m.channel_id == channel_id.to_string() => {
            messages.remove(&message_id);
            debug!(message_id, channel_id, "deleted message");
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(api_error(StatusCode::NOT_FOUND)),
    }
}
