/// Consensus barriers for ready and restart votes.
pub mod barrier;
/// Core player and color types.
pub mod game;
mod hub;
/// Seated players and their connections.
pub mod registry;
/// Color sequence generation.
pub mod sequence;
/// The authoritative game session.
pub mod session;
/// Lifecycle phases and transitions.
pub mod state_machine;
/// Turn ownership.
pub mod turn;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{config::AppConfig, dto::game::GameSnapshot};

pub use self::hub::{BroadcastHub, FrameSender, send_frame};
use self::session::GameSession;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the single game session and its subscribers.
///
/// The session mutex is the only serialization point for game mutations;
/// every inbound message and timer callback takes it before touching the
/// session and delivers the resulting effects before releasing it.
pub struct AppState {
    config: AppConfig,
    session: Mutex<GameSession>,
    hub: BroadcastHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let session = GameSession::new(config.session_rules());
        Arc::new(Self {
            config,
            session: Mutex::new(session),
            hub: BroadcastHub::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The authoritative session behind its single-writer lock.
    pub fn session(&self) -> &Mutex<GameSession> {
        &self.session
    }

    /// Subscribers receiving session broadcasts.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Current public snapshot of the session.
    pub async fn snapshot(&self) -> GameSnapshot {
        self.session.lock().await.snapshot()
    }
}
