//! WebSocket upgrade handler for live room connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Resolve the bearer token to a user
//! 2. Upgrade to WebSocket and register the connection
//! 3. Dispatch client events, writing each acknowledgment back
//! 4. Drain the connection's outbox (acks and pushes) to the socket
//! 5. Drop the connection from every routing table on close

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::adapters::room_list::BroadcastRoomListNotifier;
use crate::application::protocol::{PushEvent, PushKind, ServerMessage};
use crate::application::RoomDispatcher;
use crate::domain::foundation::{AuthError, AuthenticatedUser, ConnectionId};
use crate::ports::AuthProvider;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub dispatcher: Arc<RoomDispatcher>,
    pub auth: Arc<dyn AuthProvider>,
    /// Forwarded to every connection as `roomList.updated` when set.
    pub room_list: Option<BroadcastRoomListNotifier>,
    /// Capacity of each connection's outbox.
    pub outbound_buffer: usize,
    /// Inbound frame limit; axum's default when unset.
    pub max_frame_bytes: Option<usize>,
}

impl WebSocketState {
    pub fn new(dispatcher: Arc<RoomDispatcher>, auth: Arc<dyn AuthProvider>, outbound_buffer: usize) -> Self {
        Self {
            dispatcher,
            auth,
            room_list: None,
            outbound_buffer: outbound_buffer.max(1),
            max_frame_bytes: None,
        }
    }

    pub fn with_max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = Some(bytes);
        self
    }

    pub fn with_room_list(mut self, notifier: BroadcastRoomListNotifier) -> Self {
        self.room_list = Some(notifier);
        self
    }
}

/// Query string accepted on upgrade, for clients that cannot set headers.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /live`
///
/// The token comes from `Authorization: Bearer <token>` or `?token=`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<ConnectQuery>,
    State(state): State<WebSocketState>,
) -> Response {
    let Some(token) = bearer_token(&headers).or(query.token) else {
        return (StatusCode::UNAUTHORIZED, "Missing bearer token").into_response();
    };

    let user = match state.auth.resolve(&token).await {
        Ok(user) => user,
        Err(AuthError::ServiceUnavailable(reason)) => {
            tracing::error!(reason = %reason, "Auth provider unavailable");
            return (StatusCode::SERVICE_UNAVAILABLE, "Authentication unavailable").into_response();
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected WebSocket credential");
            return (StatusCode::UNAUTHORIZED, err.to_string()).into_response();
        }
    };

    let ws = match state.max_frame_bytes {
        Some(limit) => ws.max_message_size(limit).max_frame_size(limit),
        None => ws,
    };
    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection. Events from one connection are
/// dispatched strictly in arrival order.
async fn handle_socket(socket: WebSocket, user: AuthenticatedUser, state: WebSocketState) {
    let (mut sender, receiver) = socket.split();
    let (outbox, mut inbox) = mpsc::channel::<ServerMessage>(state.outbound_buffer);
    let connection_id = state.dispatcher.connect(user.clone(), outbox.clone()).await;

    let connections = state.dispatcher.registry().connection_count().await;
    tracing::info!(
        connection_id = %connection_id,
        user_id = %user.id,
        connections = connections,
        "WebSocket connected"
    );

    // Writer: the only task touching the sink
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = inbox.recv().await {
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
                break;
            }
        }
    });

    let list_task = state
        .room_list
        .as_ref()
        .map(|notifier| spawn_room_list_forwarder(notifier.subscribe(), outbox.clone(), connection_id));

    // Reader: dispatch each event and queue its acknowledgment
    let (stop_reading, stop) = oneshot::channel();
    let mut recv_task = tokio::spawn(read_frames(
        receiver,
        state.dispatcher.clone(),
        connection_id,
        outbox,
        stop,
    ));

    tokio::select! {
        _ = &mut send_task => {
            // Let an in-flight event finish before tearing down.
            let _ = stop_reading.send(());
            if let Err(e) = recv_task.await {
                tracing::warn!(connection_id = %connection_id, "Reader task failed: {}", e);
            }
        }
        _ = &mut recv_task => send_task.abort(),
    }
    if let Some(task) = list_task {
        task.abort();
    }

    state.dispatcher.disconnect(&connection_id).await;
    tracing::info!(connection_id = %connection_id, user_id = %user.id, "WebSocket closed");
}

/// Dispatch inbound frames until the socket ends or `stop` fires.
///
/// `stop` is only observed between frames, so an event that has started
/// dispatching always runs to completion and queues its ack.
async fn read_frames<S>(
    mut frames: S,
    dispatcher: Arc<RoomDispatcher>,
    connection_id: ConnectionId,
    outbox: mpsc::Sender<ServerMessage>,
    mut stop: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = &mut stop => break,
            frame = frames.next() => frame,
        };
        let Some(result) = frame else {
            break;
        };
        match result {
            Ok(Message::Text(text)) => {
                let ack = dispatcher.dispatch_text(&connection_id, &text).await;
                if outbox.send(ServerMessage::Ack(ack)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!(connection_id = %connection_id, "Received unsupported binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                break;
            }
        }
    }
}

fn spawn_room_list_forwarder(
    mut changes: broadcast::Receiver<crate::ports::RoomListChange>,
    outbox: mpsc::Sender<ServerMessage>,
    connection_id: ConnectionId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    let payload = match serde_json::to_value(&change) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!("Failed to encode room list change: {}", e);
                            continue;
                        }
                    };
                    let push = PushEvent::new(PushKind::RoomListUpdated, None, payload);
                    if let Err(mpsc::error::TrySendError::Closed(_)) =
                        outbox.try_send(ServerMessage::Push(push))
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(connection_id = %connection_id, skipped, "Room list subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            tracing::warn!("Dropping unserializable message: {}", e);
            Ok(())
        }
    }
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = websocket_router().with_state(ws_state);
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/live", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockAuthProvider;
    use crate::adapters::memory::{InMemoryMessageStore, InMemoryRoomStore, InMemoryUserDirectory};
    use crate::adapters::room_list::NoopRoomListNotifier;
    use crate::application::handlers::room::{RoomContext, RoomSettings};
    use crate::domain::foundation::UserId;
    use axum::http::HeaderValue;
    use serde_json::json;
    use std::time::Duration;

    fn state() -> WebSocketState {
        let ctx = RoomContext::new(
            Arc::new(InMemoryRoomStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(NoopRoomListNotifier),
            RoomSettings::default(),
        );
        WebSocketState::new(
            Arc::new(RoomDispatcher::new(Arc::new(ctx))),
            Arc::new(MockAuthProvider::new()),
            0,
        )
    }

    #[test]
    fn bearer_token_extracted_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn non_bearer_schemes_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(bearer_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn outbound_buffer_never_zero() {
        assert_eq!(state().outbound_buffer, 1);
    }

    #[test]
    fn frame_limit_is_opt_in() {
        assert_eq!(state().max_frame_bytes, None);
        assert_eq!(state().with_max_frame_bytes(4096).max_frame_bytes, Some(4096));
    }

    #[tokio::test]
    async fn stopping_the_reader_lets_the_current_event_finish() {
        let dispatcher = state().dispatcher;
        // One slot, already taken: the ack has to wait for the writer.
        let (outbox, mut inbox) = mpsc::channel(1);
        let user = AuthenticatedUser::new(UserId::new("alice").unwrap(), "Alice");
        let connection_id = dispatcher.connect(user, outbox.clone()).await;
        outbox
            .try_send(ServerMessage::Push(PushEvent::new(PushKind::RoomListUpdated, None, json!({}))))
            .unwrap();

        let create = r#"{"event":"createRoom","data":{"name":"Scrim","playerCount":2}}"#;
        let frames = futures::stream::iter(vec![Ok(Message::Text(create.to_string()))])
            .chain(futures::stream::pending());
        let (stop_reading, stop) = oneshot::channel();
        let reader = tokio::spawn(read_frames(frames, dispatcher.clone(), connection_id, outbox, stop));

        tokio::time::timeout(Duration::from_secs(1), async {
            while dispatcher.registry().session(&connection_id).await.is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        stop_reading.send(()).unwrap();

        assert!(inbox.recv().await.unwrap().as_push().is_some());
        match inbox.recv().await.unwrap() {
            ServerMessage::Ack(ack) => {
                assert!(ack.is_success());
                assert_eq!(ack.event, "createRoom");
            }
            other => panic!("expected ack, got {:?}", other),
        }
        tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn stopped_reader_ignores_queued_frames() {
        let dispatcher = state().dispatcher;
        let (outbox, mut inbox) = mpsc::channel(4);
        let user = AuthenticatedUser::new(UserId::new("bob").unwrap(), "Bob");
        let connection_id = dispatcher.connect(user, outbox.clone()).await;

        let frames = futures::stream::iter(vec![Ok(Message::Text(r#"{"event":"leave"}"#.to_string()))]);
        let (stop_reading, stop) = oneshot::channel();
        stop_reading.send(()).unwrap();
        read_frames(frames, dispatcher, connection_id, outbox, stop).await;

        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn websocket_router_creates_route() {
        let _router: axum::Router = websocket_router().with_state(state());
    }
}
