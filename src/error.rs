use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::phase::InvalidTransition;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No game is registered under the identifier.
    #[error("game `{0}` not found")]
    GameNotFound(String),
    /// A player with the same name already joined the game.
    #[error("player name `{0}` is already taken")]
    PlayerNameTaken(String),
    /// A stream subscription targeted a game that does not exist.
    #[error("invalid connection target `{0}`")]
    InvalidConnectionTarget(String),
    /// Every generated identifier collided with an existing game.
    #[error("could not allocate a unique game id")]
    DuplicateGameId,
    /// The bidder is not a player of the game.
    #[error("unknown player `{0}`")]
    UnknownPlayer(String),
    /// The bid breaks the bidding rules.
    #[error("bid rejected: {0}")]
    BidRejected(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The game's engine task is no longer running.
    #[error("auction engine for game `{0}` is unavailable")]
    EngineUnavailable(String),
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::GameNotFound(_) | ServiceError::InvalidConnectionTarget(_) => {
                AppError::NotFound(message)
            }
            ServiceError::PlayerNameTaken(_)
            | ServiceError::UnknownPlayer(_)
            | ServiceError::BidRejected(_)
            | ServiceError::InvalidInput(_) => AppError::BadRequest(message),
            ServiceError::Unauthorized(_) => AppError::Unauthorized(message),
            ServiceError::InvalidState(_) => AppError::Conflict(message),
            ServiceError::DuplicateGameId => AppError::ServiceUnavailable(message),
            ServiceError::EngineUnavailable(_) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
