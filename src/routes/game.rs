use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::game::GameSnapshot, state::SharedState};

/// Routes exposing the shared session.
pub fn router() -> Router<SharedState> {
    Router::new().route("/game", get(game_state))
}

/// Return the same snapshot players receive as `gameState`.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current session snapshot", body = GameSnapshot)
    )
)]
pub async fn game_state(State(state): State<SharedState>) -> Json<GameSnapshot> {
    Json(state.snapshot().await)
}
