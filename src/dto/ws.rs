use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::game::GameSnapshot,
    state::{
        game::{Color, PlayerId},
        session::PlayerCommand,
    },
};

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
/// Messages accepted from player WebSocket clients.
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Flag or unflag readiness in the lobby.
    #[serde(rename = "ready")]
    Ready {
        /// Desired readiness.
        ready: bool,
    },
    /// Press a pad.
    #[serde(rename = "move")]
    Move {
        /// Pad pressed.
        color: Color,
    },
    /// Acknowledge the cleared level.
    #[serde(rename = "readyForNextLevel", alias = "advanceAck")]
    ReadyForNextLevel,
    /// Cast or withdraw a restart vote.
    #[serde(rename = "voteRestart")]
    VoteRestart {
        /// `true` to vote for a restart.
        vote: bool,
    },
    /// Legacy alias for a `voteRestart` with `vote: true`.
    #[serde(rename = "requestRestart")]
    RequestRestart,
    /// Any other message type; ignored.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Map the wire message onto the session command it stands for.
    pub fn into_command(self) -> Option<PlayerCommand> {
        match self {
            Self::Ready { ready } => Some(PlayerCommand::Ready(ready)),
            Self::Move { color } => Some(PlayerCommand::Move(color)),
            Self::ReadyForNextLevel => Some(PlayerCommand::AdvanceAck),
            Self::VoteRestart { vote } => Some(PlayerCommand::VoteRestart(vote)),
            Self::RequestRestart => Some(PlayerCommand::VoteRestart(true)),
            Self::Unknown => None,
        }
    }
}

/// Everything the server pushes to players.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent only to a freshly admitted player.
    Connected(ConnectedEvent),
    /// Full session snapshot.
    GameState(GameSnapshot),
    /// Sequence to reproduce for the current level.
    Sequence(SequenceEvent),
    /// Echo of a pad press so every client can render it.
    PlayerMove(PlayerMoveEvent),
    /// The level was cleared.
    LevelComplete(LevelCompleteEvent),
    /// Progress of the next-level acknowledgements.
    WaitingForPlayers(WaitingForPlayersEvent),
    /// Progress of the restart vote.
    RestartVotes(RestartVotesEvent),
    /// A wrong color ended the round.
    GameOver(GameOverEvent),
    /// The session went back to the lobby.
    GameReset(NoticeEvent),
    /// A departure ended the round.
    PlayerLeft(NoticeEvent),
    /// Targeted rejection.
    Error(NoticeEvent),
}

impl ServerMessage {
    /// `error` message carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(NoticeEvent {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Greeting sent to a newly seated player.
pub struct ConnectedEvent {
    /// Id assigned to the recipient.
    pub player_id: PlayerId,
    /// Seated players, recipient included.
    pub player_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Sequence for the current level.
pub struct SequenceEvent {
    /// Colors in play order.
    pub sequence: Vec<Color>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Pad press echoed to everyone.
pub struct PlayerMoveEvent {
    /// Player who pressed.
    pub player_id: PlayerId,
    /// Pad pressed.
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// A level was cleared and the group must acknowledge the next one.
pub struct LevelCompleteEvent {
    /// Level just cleared (its sequence length).
    pub current_level: usize,
    /// Level about to start.
    pub next_level: usize,
    /// Levels cleared per player.
    pub scores: BTreeMap<PlayerId, u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Progress of the next-level acknowledgements.
pub struct WaitingForPlayersEvent {
    /// Players who acknowledged.
    pub ready: usize,
    /// Seated players.
    pub total: usize,
    /// Set once everybody acknowledged; the sequence follows after a delay.
    pub all_ready: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Progress of the restart vote.
pub struct RestartVotesEvent {
    /// Players voting for a restart.
    pub votes: usize,
    /// Seated players.
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// A wrong color ended the round.
pub struct GameOverEvent {
    /// Color that was expected.
    pub correct_color: Color,
    /// Color that was played instead.
    pub player_color: Color,
    /// Player who missed.
    pub player_id: PlayerId,
    /// Number of levels cleared.
    pub final_score: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Free-form human-readable notice.
pub struct NoticeEvent {
    /// Text shown to players.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_every_inbound_type() {
        let cases = [
            (
                json!({"type": "ready", "ready": true}),
                ClientMessage::Ready { ready: true },
            ),
            (
                json!({"type": "move", "color": "red"}),
                ClientMessage::Move { color: Color::Red },
            ),
            (
                json!({"type": "readyForNextLevel"}),
                ClientMessage::ReadyForNextLevel,
            ),
            (json!({"type": "advanceAck"}), ClientMessage::ReadyForNextLevel),
            (
                json!({"type": "voteRestart", "vote": false}),
                ClientMessage::VoteRestart { vote: false },
            ),
            (json!({"type": "requestRestart"}), ClientMessage::RequestRestart),
            (json!({"type": "dance"}), ClientMessage::Unknown),
        ];

        for (payload, expected) in cases {
            let parsed = ClientMessage::from_json_str(&payload.to_string()).unwrap();
            assert_eq!(parsed, expected, "payload {payload}");
        }
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(ClientMessage::from_json_str("not json").is_err());
        assert!(ClientMessage::from_json_str(r#"{"type":"move","color":"purple"}"#).is_err());
        assert!(ClientMessage::from_json_str(r#"{"type":"ready"}"#).is_err());
    }

    #[test]
    fn request_restart_is_a_yes_vote() {
        assert_eq!(
            ClientMessage::RequestRestart.into_command(),
            Some(PlayerCommand::VoteRestart(true))
        );
        assert_eq!(ClientMessage::Unknown.into_command(), None);
    }

    #[test]
    fn outbound_messages_carry_type_tag() {
        let message = ServerMessage::GameOver(GameOverEvent {
            correct_color: Color::Green,
            player_color: Color::Blue,
            player_id: "abc12345".into(),
            final_score: 3,
        });
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "gameOver",
                "correctColor": "green",
                "playerColor": "blue",
                "playerId": "abc12345",
                "finalScore": 3,
            })
        );

        let waiting = ServerMessage::WaitingForPlayers(WaitingForPlayersEvent {
            ready: 1,
            total: 3,
            all_ready: false,
        });
        assert_eq!(
            serde_json::to_value(&waiting).unwrap(),
            json!({"type": "waitingForPlayers", "ready": 1, "total": 3, "allReady": false})
        );
    }
}
