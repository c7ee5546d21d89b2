use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::db::models::SessionRequest;
use crate::db::users;
use crate::error::AppResult;
use crate::extractors::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/session", post(create_session))
}

/// Log in by username. The response body is the user id, which the client
/// sends back as its bearer token.
async fn create_session(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SessionRequest>,
) -> AppResult<(StatusCode, Json<String>)> {
    let mut conn = state.db.get()?;
    let (user, created) = users::login(&mut conn, &req.username)?;

    let status = if created {
        StatusCode::CREATED
    } else {
        tracing::info!("{} logged in", user.username);
        StatusCode::OK
    };
    Ok((status, Json(user.user_id)))
}
