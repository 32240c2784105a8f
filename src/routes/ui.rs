use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// GET / - the static chat page.
async fn index() -> Html<&'static str> {
    Html(include_str!("../../templates/index.html"))
}
