use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::{authorize, Action, Caller};
use crate::db::models::{PostStream, ResourceId};
use crate::db::{posts, users};
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{user_id}/feed", get(get_feed))
}

/// Post ids from everyone `user_id` follows, newest first. Only the owner
/// can read their feed.
async fn get_feed(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<PostStream>> {
    authorize(&caller, Action::ReadFeed(&user_id))?;
    let conn = state.db.get()?;
    users::get(&conn, &user_id)?;
    let posts = posts::feed(&conn, &user_id)?
        .into_iter()
        .map(ResourceId::from)
        .collect();
    Ok(Json(PostStream { posts }))
}
