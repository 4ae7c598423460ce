use thiserror::Error;

/// Coarse-grained phases of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Players gather and flag themselves ready.
    Lobby,
    /// A level is being played; moves are accepted.
    Active,
    /// The level was cleared; waiting for every player to acknowledge the next one.
    LevelTransition,
    /// A wrong color ended the round; a reset is pending.
    Ended,
}

impl GamePhase {
    /// Whether a round is underway (anything but the lobby).
    pub fn round_in_progress(self) -> bool {
        self != GamePhase::Lobby
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Every lobby player is ready.
    RoundStarted,
    /// The last color of the sequence was reproduced.
    LevelCleared,
    /// A wrong color was played.
    ColorMissed,
    /// Everybody acknowledged the next level.
    LevelAdvanced,
    /// Return to the lobby from anywhere.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Phase tracker with a generation counter bumped on every transition.
///
/// The generation tags delayed work so callbacks issued for an older phase
/// can be recognised and dropped.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    generation: u64,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Lobby,
            generation: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.generation += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Lobby, GameEvent::RoundStarted) => GamePhase::Active,
            (GamePhase::Active, GameEvent::LevelCleared) => GamePhase::LevelTransition,
            (GamePhase::Active, GameEvent::ColorMissed) => GamePhase::Ended,
            (GamePhase::LevelTransition, GameEvent::LevelAdvanced) => GamePhase::Active,
            (_, GameEvent::Reset) => GamePhase::Lobby,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
