use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Genius co-op server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::game_state,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameSnapshot,
            crate::dto::game::PlayerSummary,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::ws::ClientMessage,
            crate::state::game::Color,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Read-only view of the shared session"),
        (name = "players", description = "WebSocket operations for player clients"),
    )
)]
pub struct ApiDoc;
