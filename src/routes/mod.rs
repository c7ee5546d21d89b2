pub mod bans;
pub mod comments;
pub mod feed;
pub mod follows;
pub mod health;
pub mod likes;
pub mod photos;
pub mod posts;
pub mod session;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP API, ready to serve.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.storage.max_upload_bytes;

    Router::new()
        .merge(health::router())
        .merge(session::router())
        .merge(users::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(likes::router())
        .merge(follows::router())
        .merge(bans::router())
        .merge(photos::router())
        .merge(feed::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
