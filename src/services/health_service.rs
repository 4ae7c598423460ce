use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with the number of connected players.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let players = state.session().lock().await.player_count();
    let subscribers = state.hub().len();
    if players != subscribers {
        debug!(players, subscribers, "player and subscriber counts differ");
    }
    HealthResponse::ok(players)
}
