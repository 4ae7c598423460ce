use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status (always "ok" when the server answers).
    pub status: String,
    /// Players currently seated in the session.
    pub players: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(players: usize) -> Self {
        Self {
            status: "ok".to_string(),
            players,
        }
    }
}
