use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the bracket auction backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::join_game,
        crate::routes::game::view_game,
        crate::routes::game::place_bid,
        crate::routes::game::scores,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::CreateGameResponse,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::BidRequest,
            crate::dto::game::DetailResponse,
            crate::dto::game::ViewGameResponse,
            crate::dto::game::ScoresResponse,
            crate::dto::game::GameSnapshot,
            crate::dto::ws::InboundMessage,
            crate::dto::ws::OutboundMessage,
            crate::dto::ws::SignalKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game lifecycle and bidding"),
        (name = "stream", description = "WebSocket game event stream"),
    )
)]
pub struct ApiDoc;
