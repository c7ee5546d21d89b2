use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use super::comments::{addressed_comment, visible_comment};
use super::posts::visible_post;
use crate::auth::{authorize, Action, Caller};
use crate::db::likes::{self, LikeTarget};
use crate::db::posts;
use crate::db::models::LikeCollection;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/posts/{post_id}/likes",
            get(list_post_likes),
        )
        .route(
            "/users/{user_id}/posts/{post_id}/likes/{like_id}",
            put(like_post).delete(unlike_post),
        )
        .route(
            "/users/{user_id}/posts/{post_id}/comments/{comment_id}/likes",
            get(list_comment_likes),
        )
        .route(
            "/users/{user_id}/posts/{post_id}/comments/{comment_id}/likes/{like_id}",
            put(like_comment).delete(unlike_comment),
        )
}

async fn list_post_likes(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id)): Path<(String, String)>,
) -> AppResult<Json<LikeCollection>> {
    let conn = state.db.get()?;
    let post = visible_post(&conn, &user_id, &post_id, &caller)?;
    let likes = likes::list(&conn, LikeTarget::Post, &post.post_id, caller.as_str())?;
    Ok(Json(LikeCollection { likes }))
}

/// `like_id` names the liker; the caller can only like as themselves.
async fn like_post(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, like_id)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Like(&like_id))?;
    let mut conn = state.db.get()?;
    let post = visible_post(&conn, &user_id, &post_id, &caller)?;
    likes::like(&mut conn, LikeTarget::Post, &post.post_id, &like_id)?;
    Ok(StatusCode::OK)
}

// No visibility check: a banned user may still withdraw an earlier like.
async fn unlike_post(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, like_id)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Unlike(&like_id))?;
    let mut conn = state.db.get()?;
    let post = posts::get_owned(&conn, &user_id, &post_id)?;
    likes::unlike(&mut conn, LikeTarget::Post, &post.post_id, &like_id)?;
    Ok(StatusCode::OK)
}

async fn list_comment_likes(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, comment_id)): Path<(String, String, String)>,
) -> AppResult<Json<LikeCollection>> {
    let conn = state.db.get()?;
    let comment = visible_comment(&conn, &user_id, &post_id, &comment_id, &caller)?;
    let likes = likes::list(
        &conn,
        LikeTarget::Comment,
        &comment.comment_id,
        caller.as_str(),
    )?;
    Ok(Json(LikeCollection { likes }))
}

async fn like_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, comment_id, like_id)): Path<(String, String, String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Like(&like_id))?;
    let mut conn = state.db.get()?;
    let comment = visible_comment(&conn, &user_id, &post_id, &comment_id, &caller)?;
    likes::like(&mut conn, LikeTarget::Comment, &comment.comment_id, &like_id)?;
    Ok(StatusCode::OK)
}

async fn unlike_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, comment_id, like_id)): Path<(String, String, String, String)>,
) -> AppResult<StatusCode> {
    authorize(&caller, Action::Unlike(&like_id))?;
    let mut conn = state.db.get()?;
    let comment = addressed_comment(&conn, &user_id, &post_id, &comment_id)?;
    likes::unlike(&mut conn, LikeTarget::Comment, &comment.comment_id, &like_id)?;
    Ok(StatusCode::OK)
}

