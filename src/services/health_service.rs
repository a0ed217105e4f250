use tracing::debug;

use crate::{
    dto::{format_system_time, health::HealthResponse},
    state::SharedState,
};

/// Report liveness together with the number of registered games.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let games = state.games().len();
    debug!(games, "health check");
    HealthResponse::ok(games, format_system_time(state.started_at()))
}
