use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::phase::VisibleGamePhase,
    state::game::{Color, Player, PlayerId},
};

/// Public view of the whole session, broadcast as `gameState`.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// A round is underway (any phase but the lobby).
    pub is_active: bool,
    /// The session sits in the lobby.
    pub waiting_for_players: bool,
    /// Current phase.
    pub phase: VisibleGamePhase,
    /// Connected players.
    pub player_count: usize,
    /// Players in join order.
    pub players: Vec<PlayerSummary>,
    /// Number of colors of the current sequence already reproduced.
    pub current_step: usize,
    /// Levels cleared per player in the current round.
    pub scores: BTreeMap<PlayerId, u32>,
}

/// Public view of a single player.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    /// Player id.
    pub id: PlayerId,
    /// Pad color, assigned when a round starts.
    pub color: Option<Color>,
    /// Flagged ready in the lobby.
    pub ready: bool,
    /// Holds the turn.
    pub turn: bool,
    /// Votes for a restart.
    pub voted_restart: bool,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            color: player.color,
            ready: player.ready,
            turn: player.is_turn,
            voted_restart: player.voted_restart,
        }
    }
}
