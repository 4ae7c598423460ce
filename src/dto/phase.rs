use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (WebSocket/REST).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for players to get ready.
    Lobby,
    /// A level is being played.
    Active,
    /// Level cleared, waiting for acknowledgements.
    LevelTransition,
    /// Round lost, reset pending.
    Ended,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::Active => VisibleGamePhase::Active,
            GamePhase::LevelTransition => VisibleGamePhase::LevelTransition,
            GamePhase::Ended => VisibleGamePhase::Ended,
        }
    }
}
