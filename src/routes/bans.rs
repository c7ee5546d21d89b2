use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::auth::{authorize, Action, Caller};
use crate::db::bans;
use crate::db::models::UserCollection;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/banned", get(list_banned))
        .route(
            "/users/{user_id}/banned/{banned_id}",
            put(ban_user).delete(unban_user),
        )
}

async fn list_banned(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserCollection>> {
    authorize(&caller, Action::ListBanned(&user_id))?;
    let conn = state.db.get()?;
    let users = bans::banned_users(&conn, &user_id)?;
    Ok(Json(UserCollection { users }))
}

async fn ban_user(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, banned_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Ban(&user_id))?;
    let mut conn = state.db.get()?;
    bans::ban(&mut conn, &user_id, &banned_id)?;
    Ok(StatusCode::OK)
}

async fn unban_user(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, banned_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Unban(&user_id))?;
    let conn = state.db.get()?;
    bans::unban(&conn, &user_id, &banned_id)?;
    Ok(StatusCode::OK)
}
