//! scrim-rooms server binary.
//!
//! Wires configuration, logging, the in-memory adapters and the room
//! dispatcher behind an axum WebSocket endpoint.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scrim_rooms::adapters::{
    websocket_router, BroadcastRoomListNotifier, InMemoryMessageStore, InMemoryRoomStore,
    InMemoryUserDirectory, JwtAuthProvider, WebSocketState,
};
use scrim_rooms::application::handlers::{RoomContext, RoomSettings};
use scrim_rooms::application::RoomDispatcher;
use scrim_rooms::config::{AppConfig, ServerConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let room_list = BroadcastRoomListNotifier::new(config.rooms.room_list_buffer);
    let ctx = RoomContext::new(
        Arc::new(InMemoryRoomStore::new()),
        Arc::new(InMemoryMessageStore::new()),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(room_list.clone()),
        RoomSettings {
            history_limit: config.rooms.history_limit,
            max_message_length: config.rooms.max_message_length,
        },
    );
    let dispatcher = Arc::new(RoomDispatcher::new(Arc::new(ctx)));
    let auth = Arc::new(JwtAuthProvider::new(&config.auth));
    let ws_state = WebSocketState::new(dispatcher, auth, config.rooms.outbound_buffer)
        .with_room_list(room_list)
        .with_max_frame_bytes(config.server.max_frame_bytes);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(websocket_router().with_state(ws_state))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "scrim-rooms listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if server.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

/// Listed origins only; any origin when none are configured outside
/// production.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() && !server.is_production() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
