/// OpenAPI documentation generation.
pub mod documentation;
/// Serialization point applying player commands and timers to the session.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
