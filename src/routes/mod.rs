use axum::Router;
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// When a static directory is configured it serves every path no route matched.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(websocket::router())
        .merge(game::router());

    let docs_router = docs::router(state.clone());
    let router = api_router.merge(docs_router);

    let router = match state.config().static_dir() {
        Some(dir) => {
            info!(dir = %dir.display(), "serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router.with_state(state)
}
