use axum::{
    Router,
    extract::{Path, Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{services::websocket_service, state::SharedState};

/// Optional credentials presented when opening the stream.
#[derive(Debug, Deserialize, IntoParams)]
pub struct StreamQuery {
    /// Creator token returned by game creation; required to start the game.
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/ws/{id}",
    tag = "stream",
    params(
        ("id" = String, Path, description = "Game identifier"),
        StreamQuery
    ),
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a game event stream.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket, id, query.token))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws/{id}", get(ws_handler))
}
