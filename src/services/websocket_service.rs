use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{INVALID_GAME_CLOSE_CODE, INVALID_GAME_CLOSE_REASON, InboundMessage, OutboundMessage},
    error::ServiceError,
    services::auction::AuctionHandle,
    state::{
        SharedState,
        hub::{HubConnection, send_to},
    },
};

/// Handle the full lifecycle of a game WebSocket connection.
///
/// Unknown games are closed right away with [`INVALID_GAME_CLOSE_CODE`]. Otherwise the
/// connection receives a snapshot, then every event of the game until either side
/// closes. `token` is the creator token presented at upgrade time, if any.
pub async fn handle_socket(
    state: SharedState,
    socket: WebSocket,
    game_id: String,
    token: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let handle = match subscribe_target(&state, &game_id) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(game_id = %game_id, error = %err, "rejecting websocket subscription");
            let frame = CloseFrame {
                code: INVALID_GAME_CLOSE_CODE,
                reason: Utf8Bytes::from_static(INVALID_GAME_CLOSE_REASON),
            };
            let _ = sender.send(Message::Close(Some(frame))).await;
            return;
        }
    };

    let connection_id = Uuid::new_v4();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let connection = HubConnection {
        id: connection_id,
        tx: outbound_tx.clone(),
    };

    if let Err(err) = handle.subscribe(connection).await {
        warn!(game_id = %game_id, error = %err, "failed to subscribe websocket");
        let _ = sender.send(Message::Close(None)).await;
        return;
    }
    info!(game_id = %game_id, %connection_id, "websocket connected");

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                let Some(message) = outbound else { break };
                if sender.send(message).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&handle, token.as_deref(), &outbound_tx, text.as_str()).await;
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(game_id = %game_id, %connection_id, "websocket closed by client");
                    let _ = sender.send(Message::Close(frame)).await;
                    break;
                }
                Some(Ok(Message::Binary(_) | Message::Pong(_))) => {}
                Some(Err(err)) => {
                    warn!(game_id = %game_id, %connection_id, error = %err, "websocket error");
                    break;
                }
                None => break,
            },
        }
    }

    state.hub().unregister(&game_id, connection_id);
    info!(game_id = %game_id, %connection_id, "websocket disconnected");
}

/// Resolve the engine of `game_id` for a stream subscription.
pub fn subscribe_target(state: &SharedState, game_id: &str) -> Result<AuctionHandle, ServiceError> {
    state
        .games()
        .get(game_id)
        .map_err(|_| ServiceError::InvalidConnectionTarget(game_id.to_string()))
}

/// Act on a text frame, reporting failures back on the same socket.
async fn handle_text(
    handle: &AuctionHandle,
    token: Option<&str>,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    text: &str,
) {
    let result = match InboundMessage::parse(text) {
        Ok(InboundMessage::StartGame) => match token {
            Some(token) => handle.start(token.to_string()).await,
            None => Err(ServiceError::Unauthorized(
                "a creator token is required to start the game".into(),
            )),
        },
        Ok(InboundMessage::Unknown) => Err(ServiceError::InvalidInput(format!(
            "unsupported message `{text}`"
        ))),
        Err(err) => Err(ServiceError::InvalidInput(format!(
            "malformed message: {err}"
        ))),
    };

    if let Err(err) = result {
        warn!(game_id = %handle.game_id(), error = %err, "websocket command failed");
        send_to(
            outbound_tx,
            &OutboundMessage::Error {
                error: err.to_string(),
            },
        );
    }
}
