use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::game::{
        BidRequest, CreateGameRequest, CreateGameResponse, DetailResponse, JoinGameRequest,
        ScoresResponse, ViewGameResponse,
    },
    error::ServiceError,
    services::auction::AuctionHandle,
    state::{SharedState, game::Game},
};

/// Characters used in generated game identifiers.
const GAME_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Open a new game with `request.player` as creator and first player.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<CreateGameResponse, ServiceError> {
    let settings = state.config().auction();
    let creator = request.player;
    let creator_token = Uuid::new_v4().simple().to_string();

    let handle = state.games().register(
        || generate_game_id(settings.game_id_length),
        |game_id| {
            let game = Game::new(
                game_id,
                creator.clone(),
                creator_token.clone(),
                state.bracket().teams(),
                settings,
            );
            AuctionHandle::spawn(game, state.hub().clone(), state.bracket().clone())
        },
    )?;

    info!(game_id = %handle.game_id(), creator = %creator, "game created");
    Ok(CreateGameResponse {
        id: handle.game_id().to_string(),
        creator_token,
    })
}

/// Add a player to an existing game.
pub async fn join_game(
    state: &SharedState,
    game_id: &str,
    request: JoinGameRequest,
) -> Result<DetailResponse, ServiceError> {
    let handle = state.games().get(game_id)?;
    let player = request.player;
    handle.join(player.clone()).await?;
    Ok(DetailResponse::new(format!("{player} joined game {game_id}")))
}

/// Summarize a game and rebroadcast its roster to subscribers.
pub async fn view_game(
    state: &SharedState,
    game_id: &str,
) -> Result<ViewGameResponse, ServiceError> {
    let handle = state.games().get(game_id)?;
    let game = handle.view().await?;
    Ok(ViewGameResponse {
        detail: format!("game {game_id} has {} players", game.players.len()),
        game,
    })
}

/// Bid on the open lot of a game.
pub async fn place_bid(
    state: &SharedState,
    game_id: &str,
    request: BidRequest,
) -> Result<DetailResponse, ServiceError> {
    let handle = state.games().get(game_id)?;
    let BidRequest { player, bid, team } = request;
    let detail = format!("{player} bid {bid} on {team}");
    handle.place_bid(player, bid, team).await?;
    Ok(DetailResponse::new(detail))
}

/// Score a game against the match results known so far.
pub async fn scores(state: &SharedState, game_id: &str) -> Result<ScoresResponse, ServiceError> {
    let handle = state.games().get(game_id)?;
    Ok(ScoresResponse {
        scores: handle.scores().await?,
    })
}

/// Random identifier of `len` characters over `A-Z0-9`.
pub fn generate_game_id(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(GAME_ID_ALPHABET[rng.random_range(0..GAME_ID_ALPHABET.len())]))
        .collect()
}
