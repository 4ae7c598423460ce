/// Session snapshot payloads.
pub mod game;
/// Health check payloads.
pub mod health;
/// Public-facing phase representation.
pub mod phase;
/// WebSocket messages exchanged with players.
pub mod ws;
