//! HTTP and WebSocket surface of the relay.
//!
//! - `GET /ws/:lang` upgrades to a chat socket speaking `lang`
//! - `GET /translate?text=..&dest=..&src=..` one-off translation lookup
//! - `GET /health` open connections and translation metrics
//! - `GET /languages` supported language table
//! - `GET /` the static chat page

use crate::config::Config;
use crate::i18n::{LanguageConfig, LanguageRegistry, LanguageTag, MetricsReport};
use crate::provider::GoogleTranslateProvider;
use crate::relay::{
    receive_loop, ChatRelay, ConnectionHandle, ConnectionInfo, InboundFrame, Outbound,
};
use crate::translation::TranslationGateway;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{services::ServeFile, trace::TraceLayer};
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
}

/// Build the relay backed by the configured translation provider.
pub fn relay_from_config(config: &Config) -> Result<Arc<ChatRelay>> {
    // No client-level timeout: the gateway bounds each call and counts expiries
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client for translation provider")?;

    let provider = GoogleTranslateProvider::new(client, config.translate_api_url.clone());
    let gateway =
        TranslationGateway::new(Arc::new(provider)).with_timeout(config.translate_timeout);

    Ok(Arc::new(ChatRelay::new(gateway)))
}

pub fn router(relay: Arc<ChatRelay>, index_path: &str) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(index_path))
        .route("/ws/:lang", get(chat_socket))
        .route("/translate", get(translate_lookup))
        .route("/health", get(health))
        .route("/languages", get(languages))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

/// GET /ws/:lang
async fn chat_socket(
    ws: WebSocketUpgrade,
    Path(lang): Path<String>,
    State(state): State<AppState>,
) -> Response {
    debug!("Chat socket requested for {}", lang);
    ws.on_upgrade(move |socket| handle_socket(socket, LanguageTag::new(lang), state.relay))
}

async fn handle_socket(socket: WebSocket, language: LanguageTag, relay: Arc<ChatRelay>) {
    let (mut sink, stream) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::channel();
    let id = relay.connect(language, handle);

    // Dropping `outbound` on a failed write makes later broadcasts to this
    // connection fail, which unregisters it.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let (message, closing) = match frame {
                Outbound::Text(text) => (Message::Text(text), false),
                Outbound::Close => (Message::Close(None), true),
            };
            if let Err(e) = sink.send(message).await {
                debug!("Write to {} failed: {}", id, e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    let inbound = stream.map(|frame| frame.map(inbound_frame));
    receive_loop(&relay, id, inbound).await;

    writer.abort();
    info!("{} socket closed", id);
}

fn inbound_frame(message: Message) -> InboundFrame {
    match message {
        Message::Text(text) => InboundFrame::Text(text),
        Message::Close(_) => InboundFrame::Close,
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => InboundFrame::Ignored,
    }
}

fn default_source() -> String {
    "auto".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TranslateQuery {
    pub text: String,
    pub dest: String,
    #[serde(default = "default_source")]
    pub src: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// GET /translate
///
/// Failures are reported as the literal "Translation Failed" text.
async fn translate_lookup(
    State(state): State<AppState>,
    Query(query): Query<TranslateQuery>,
) -> Json<TranslateResponse> {
    let result = state
        .relay
        .gateway()
        .translate(&query.text, &query.dest, Some(query.src.as_str()))
        .await;

    Json(TranslateResponse {
        translated_text: result.into_text_or_marker(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub members: Vec<ConnectionInfo>,
    pub translation: MetricsReport,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.relay.registry().len(),
        members: state.relay.registry().connections(),
        translation: state.relay.gateway().metrics().report(),
    })
}

/// GET /languages
async fn languages() -> Json<Vec<&'static LanguageConfig>> {
    Json(LanguageRegistry::get().list_all())
}
