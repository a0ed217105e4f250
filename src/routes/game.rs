use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::game::{
        BidRequest, CreateGameRequest, CreateGameResponse, DetailResponse, JoinGameRequest,
        ScoresResponse, ViewGameResponse,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes handling game lifecycle and bidding.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/{id}", get(view_game))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/bid", post(place_bid))
        .route("/games/{id}/scores", get(scores))
}

/// Open a new game and return its id and the creator token.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = CreateGameResponse),
        (status = 400, description = "Invalid player name"),
        (status = 503, description = "No free game id could be allocated")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, AppError> {
    payload.validate()?;
    let created = game_service::create_game(&state, payload).await?;
    Ok(Json(created))
}

/// Join an existing game under a unique name.
#[utoipa::path(
    post,
    path = "/games/{id}/join",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Player joined", body = DetailResponse),
        (status = 400, description = "Name already taken or invalid"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    payload.validate()?;
    let detail = game_service::join_game(&state, &id, payload).await?;
    Ok(Json(detail))
}

/// Summarize a game and push the roster to its subscribers.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game summary", body = ViewGameResponse),
        (status = 404, description = "Game not found")
    )
)]
pub async fn view_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ViewGameResponse>, AppError> {
    let view = game_service::view_game(&state, &id).await?;
    Ok(Json(view))
}

/// Bid on the lot currently open in a game.
#[utoipa::path(
    post,
    path = "/games/{id}/bid",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    request_body = BidRequest,
    responses(
        (status = 200, description = "Bid accepted", body = DetailResponse),
        (status = 400, description = "Bid rejected"),
        (status = 404, description = "Game not found"),
        (status = 409, description = "No lot is open")
    )
)]
pub async fn place_bid(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<BidRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    payload.validate()?;
    let detail = game_service::place_bid(&state, &id, payload).await?;
    Ok(Json(detail))
}

/// Score a game against the known match results.
#[utoipa::path(
    get,
    path = "/games/{id}/scores",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Scoreboard", body = ScoresResponse),
        (status = 404, description = "Game not found")
    )
)]
pub async fn scores(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ScoresResponse>, AppError> {
    let scores = game_service::scores(&state, &id).await?;
    Ok(Json(scores))
}
