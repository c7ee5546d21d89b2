use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::auth::{authorize, ensure_can_view, Action, Caller};
use crate::db::models::UserCollection;
use crate::db::{follows, users};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/followers", get(list_followers))
        .route("/users/{user_id}/following", get(list_following))
        .route(
            "/users/{user_id}/following/{following_id}",
            put(follow).delete(unfollow),
        )
}

async fn list_followers(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserCollection>> {
    let conn = state.db.get()?;
    ensure_can_view(&conn, &user_id, &caller)?;
    if !users::exists(&conn, &user_id)? {
        return Err(AppError::NotFound("User".into()));
    }
    let users = follows::followers(&conn, &user_id, caller.as_str())?;
    Ok(Json(UserCollection { users }))
}

async fn list_following(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserCollection>> {
    let conn = state.db.get()?;
    ensure_can_view(&conn, &user_id, &caller)?;
    if !users::exists(&conn, &user_id)? {
        return Err(AppError::NotFound("User".into()));
    }
    let users = follows::following(&conn, &user_id, caller.as_str())?;
    Ok(Json(UserCollection { users }))
}

/// `user_id` starts following `following_id`. Only `user_id` may do this,
/// and not toward someone who has banned them.
async fn follow(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, following_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Follow(&user_id))?;
    let mut conn = state.db.get()?;
    ensure_can_view(&conn, &following_id, &caller)?;
    follows::follow(&mut conn, &user_id, &following_id)?;
    Ok(StatusCode::OK)
}

async fn unfollow(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, following_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Unfollow(&user_id))?;
    let mut conn = state.db.get()?;
    follows::unfollow(&mut conn, &user_id, &following_id)?;
    Ok(StatusCode::OK)
}
