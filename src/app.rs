use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{chat, health, ui};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .merge(ui::router())
        .nest("/chat", chat::router())
        .nest("/health", health::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
