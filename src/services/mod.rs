/// Per-game auction engine task and its handle.
pub mod auction;
/// WebSocket event construction and fan-out.
pub mod auction_events;
/// Cancellable countdown ticker.
pub mod countdown;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation, joining, viewing and bidding.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Scoring of purchases against match results.
pub mod scoring;
/// WebSocket connection and message handling service.
pub mod websocket_service;
