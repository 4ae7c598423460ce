//! Application-level configuration loading, including the session rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{game::Color, session::SessionRules, turn::TurnMode};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GENIUS_COOP_CONFIG_PATH";
/// A round always needs at least two players.
const MIN_PLAYERS_FLOOR: usize = 2;
/// One seat per pad color.
const MAX_PLAYERS_CEILING: usize = Color::ALL.len();

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rules: SessionRules,
    static_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        rules = ?app_config.rules,
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Rules handed to the game session.
    pub fn session_rules(&self) -> SessionRules {
        self.rules.clone()
    }

    /// Directory served as a static fallback, if any.
    pub fn static_dir(&self) -> Option<&PathBuf> {
        self.static_dir.as_ref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    max_players: Option<usize>,
    min_players: Option<usize>,
    initial_sequence_length: Option<usize>,
    game_over_grace_ms: Option<u64>,
    next_level_delay_ms: Option<u64>,
    turn_mode: Option<TurnMode>,
    rng_seed: Option<u64>,
    static_dir: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = SessionRules::default();
        let max_players = value
            .max_players
            .unwrap_or(defaults.max_players)
            .clamp(MIN_PLAYERS_FLOOR, MAX_PLAYERS_CEILING);
        let rules = SessionRules {
            max_players,
            min_players: value
                .min_players
                .unwrap_or(defaults.min_players)
                .clamp(MIN_PLAYERS_FLOOR, max_players),
            initial_sequence_length: value
                .initial_sequence_length
                .unwrap_or(defaults.initial_sequence_length)
                .max(1),
            game_over_grace: value
                .game_over_grace_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.game_over_grace),
            next_level_delay: value
                .next_level_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.next_level_delay),
            turn_mode: value.turn_mode.unwrap_or(defaults.turn_mode),
            rng_seed: value.rng_seed,
        };

        Self {
            rules,
            static_dir: value.static_dir.filter(|dir| !dir.as_os_str().is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session_rules(), SessionRules::default());
        assert!(config.static_dir().is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_json_str(
            r#"{
                "max_players": 3,
                "game_over_grace_ms": 250,
                "next_level_delay_ms": 0,
                "turn_mode": "open",
                "rng_seed": 99,
                "static_dir": "public"
            }"#,
        )
        .unwrap();
        let rules = config.session_rules();
        assert_eq!(rules.max_players, 3);
        assert_eq!(rules.min_players, 2);
        assert_eq!(rules.game_over_grace, Duration::from_millis(250));
        assert_eq!(rules.next_level_delay, Duration::ZERO);
        assert_eq!(rules.turn_mode, TurnMode::Open);
        assert_eq!(rules.rng_seed, Some(99));
        assert_eq!(config.static_dir(), Some(&PathBuf::from("public")));
    }

    #[test]
    fn nonsensical_sizes_are_clamped() {
        let rules = AppConfig::from_json_str(
            r#"{"max_players": 0, "min_players": 9, "initial_sequence_length": 0}"#,
        )
        .unwrap()
        .session_rules();
        assert_eq!(rules.max_players, 2);
        assert_eq!(rules.min_players, 2);
        assert_eq!(rules.initial_sequence_length, 1);

        let rules = AppConfig::from_json_str(r#"{"max_players": 6, "min_players": 1}"#)
            .unwrap()
            .session_rules();
        assert_eq!(rules.max_players, 4);
        assert_eq!(rules.min_players, 2);
    }

    #[test]
    fn lone_player_cannot_start_with_relaxed_minimum() {
        use uuid::Uuid;

        use crate::state::{
            session::{GameSession, PlayerCommand},
            state_machine::GamePhase,
        };

        let rules = AppConfig::from_json_str(r#"{"min_players": 1, "rng_seed": 1}"#)
            .unwrap()
            .session_rules();
        let mut session = GameSession::new(rules);
        let connection = Uuid::new_v4();
        session.connect(connection).unwrap();
        session
            .handle(connection, PlayerCommand::Ready(true))
            .unwrap();
        assert_eq!(session.phase(), GamePhase::Lobby);
    }

    #[test]
    fn unknown_turn_mode_is_an_error() {
        assert!(AppConfig::from_json_str(r#"{"turn_mode": "chaos"}"#).is_err());
    }
}
