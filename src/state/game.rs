use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Opaque identifier handed to a player when their connection is admitted.
pub type PlayerId = String;

/// Transport-level handle of a live connection.
pub type ConnectionId = Uuid;

const PLAYER_ID_LEN: usize = 8;
const PLAYER_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// One of the four pads a player can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Green pad.
    Green,
    /// Red pad.
    Red,
    /// Yellow pad.
    Yellow,
    /// Blue pad.
    Blue,
}

impl Color {
    /// Every color in pad order; colors are handed out to players in this order.
    pub const ALL: [Color; 4] = [Color::Green, Color::Red, Color::Yellow, Color::Blue];

    /// Draw a color uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Per-connection player record owned by the connection registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Identifier sent back to the client in the `connected` message.
    pub id: PlayerId,
    /// Pad color assigned when a round starts.
    pub color: Option<Color>,
    /// Whether the player flagged themselves ready in the lobby.
    pub ready: bool,
    /// Whether the player currently holds the turn.
    pub is_turn: bool,
    /// Whether the player currently votes for a restart.
    pub voted_restart: bool,
}

impl Player {
    /// Fresh player record with every flag cleared.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            color: None,
            ready: false,
            is_turn: false,
            voted_restart: false,
        }
    }
}

/// Generate a random lowercase base-36 player identifier.
pub fn random_player_id<R: Rng + ?Sized>(rng: &mut R) -> PlayerId {
    (0..PLAYER_ID_LEN)
        .map(|_| {
            let index = rng.random_range(0..PLAYER_ID_ALPHABET.len());
            char::from(PLAYER_ID_ALPHABET[index])
        })
        .collect()
}
