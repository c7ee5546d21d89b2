use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::Connection;

use crate::auth::{authorize, ensure_can_view, Action, Caller};
use crate::db::models::{Post, PostDraft, PostStream, ResourceId};
use crate::db::{posts, users};
use crate::error::{AppError, AppResult};
use crate::extractors::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/posts", get(list_posts).post(create_post))
        .route(
            "/users/{user_id}/posts/{post_id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

/// Resolve a post through its author's path, enforcing the viewer's
/// visibility on the author first.
pub(crate) fn visible_post(
    conn: &Connection,
    user_id: &str,
    post_id: &str,
    caller: &Caller,
) -> AppResult<Post> {
    ensure_can_view(conn, user_id, caller)?;
    Ok(posts::get_owned(conn, user_id, post_id)?)
}

async fn list_posts(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> AppResult<Json<PostStream>> {
    let conn = state.db.get()?;
    ensure_can_view(&conn, &user_id, &caller)?;
    if !users::exists(&conn, &user_id)? {
        return Err(AppError::NotFound("User".into()));
    }
    let posts = posts::list_by_owner(&conn, &user_id)?
        .into_iter()
        .map(ResourceId::from)
        .collect();
    Ok(Json(PostStream { posts }))
}

async fn create_post(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    JsonBody(draft): JsonBody<PostDraft>,
) -> AppResult<(StatusCode, Json<Post>)> {
    authorize(&caller, Action::CreatePost(&user_id))?;
    let mut conn = state.db.get()?;
    let post = posts::create(&mut conn, &user_id, &draft)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id)): Path<(String, String)>,
) -> AppResult<Json<Post>> {
    let conn = state.db.get()?;
    Ok(Json(visible_post(&conn, &user_id, &post_id, &caller)?))
}

async fn update_post(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id)): Path<(String, String)>,
    JsonBody(draft): JsonBody<PostDraft>,
) -> AppResult<Json<Post>> {
    authorize(&caller, Action::EditPost(&user_id))?;
    let conn = state.db.get()?;
    Ok(Json(posts::update(&conn, &user_id, &post_id, &draft)?))
}

async fn delete_post(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::DeletePost(&user_id))?;
    let conn = state.db.get()?;
    posts::delete(&conn, &user_id, &post_id)?;
    Ok(StatusCode::OK)
}
