use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Number of games registered since start-up.
    pub games: usize,
    /// Process start time (RFC 3339).
    pub started_at: String,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(games: usize, started_at: String) -> Self {
        Self {
            status: "ok".to_string(),
            games,
            started_at,
        }
    }
}
