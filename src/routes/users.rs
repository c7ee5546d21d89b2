use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::{authorize, ensure_can_view, Action, Caller};
use crate::db::models::{ProfileUpdate, User, UserCollection};
use crate::db::users;
use crate::error::AppResult;
use crate::extractors::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(search_users))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    username: String,
}

async fn search_users(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<UserCollection>> {
    let conn = state.db.get()?;
    let users = users::search(&conn, &params.username, caller.as_str())?;
    Ok(Json(UserCollection { users }))
}

async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    let conn = state.db.get()?;
    ensure_can_view(&conn, &user_id, &caller)?;
    Ok(Json(users::get(&conn, &user_id)?))
}

async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> AppResult<Json<User>> {
    authorize(&caller, Action::EditProfile(&user_id))?;
    let mut conn = state.db.get()?;
    Ok(Json(users::update(&mut conn, &user_id, &update)?))
}

async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::DeleteProfile(&user_id))?;
    let conn = state.db.get()?;
    users::delete(&conn, &user_id)?;
    Ok(StatusCode::OK)
}
