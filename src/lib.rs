//! Library crate for genius-coop-back: a cooperative color-sequence memory game
//! served over WebSocket, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Wire and HTTP payloads.
pub mod dto;
/// Error types shared across layers.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Services bridging transport and the game session.
pub mod services;
/// Game domain and shared application state.
pub mod state;
