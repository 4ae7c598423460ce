use thiserror::Error;

use crate::state::{
    game::{ConnectionId, PlayerId},
    state_machine::GamePhase,
};

/// Reasons a new connection is refused a seat.
///
/// The display text is sent verbatim to the rejected client before the socket closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    /// All seats are taken.
    #[error("Game is full! Try again later.")]
    CapacityExceeded,
    /// A round is in progress and does not accept new players.
    #[error("Game in progress! Wait for the current round to finish before joining.")]
    SessionBusy,
}

/// Commands the session refused to apply.
///
/// None of these are reported to clients; the command is simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The connection is not (or no longer) registered.
    #[error("unknown connection `{0}`")]
    UnknownConnection(ConnectionId),
    /// A move came from a player who does not hold the turn.
    #[error("player `{0}` moved out of turn")]
    InvalidTurn(PlayerId),
    /// The command has no meaning in the current phase.
    #[error("`{command}` is not accepted while {phase:?}")]
    NotAccepted {
        /// Wire name of the rejected command.
        command: &'static str,
        /// Phase the session was in.
        phase: GamePhase,
    },
}

/// Failures local to a single WebSocket connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Inbound payload could not be parsed.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Writer side of the connection is gone.
    #[error("peer unreachable")]
    PeerUnreachable,
}
