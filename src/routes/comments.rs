use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::Connection;

use super::posts::visible_post;
use crate::auth::{authorize, ensure_can_view, Action, Caller};
use crate::db::{comments, posts};
use crate::db::models::{Comment, CommentDraft, CommentEdit, CommentStream};
use crate::error::AppResult;
use crate::extractors::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/posts/{post_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/users/{user_id}/posts/{post_id}/comments/{comment_id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
}

/// Resolve a comment through its post's path. The caller must be able to see
/// both the post author and the comment author.
pub(crate) fn visible_comment(
    conn: &Connection,
    user_id: &str,
    post_id: &str,
    comment_id: &str,
    caller: &Caller,
) -> AppResult<Comment> {
    let post = visible_post(conn, user_id, post_id, caller)?;
    let comment = comments::get_in_post(conn, &post.post_id, comment_id)?;
    ensure_can_view(conn, &comment.author_id, caller)?;
    Ok(comment)
}

/// Resolve a comment through its post's path without any visibility check.
/// Used where only the comment author's identity matters.
pub(crate) fn addressed_comment(
    conn: &Connection,
    user_id: &str,
    post_id: &str,
    comment_id: &str,
) -> AppResult<Comment> {
    let post = posts::get_owned(conn, user_id, post_id)?;
    Ok(comments::get_in_post(conn, &post.post_id, comment_id)?)
}

async fn list_comments(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id)): Path<(String, String)>,
) -> AppResult<Json<CommentStream>> {
    let conn = state.db.get()?;
    let post = visible_post(&conn, &user_id, &post_id, &caller)?;
    let comments = comments::list_for_post(&conn, &post.post_id, caller.as_str())?;
    Ok(Json(CommentStream { comments }))
}

async fn create_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id)): Path<(String, String)>,
    JsonBody(draft): JsonBody<CommentDraft>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    authorize(&caller, Action::CreateComment(&draft.author_id))?;
    let mut conn = state.db.get()?;
    let post = visible_post(&conn, &user_id, &post_id, &caller)?;
    let comment = comments::create(&mut conn, &post.post_id, &draft.author_id, &draft.caption)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, comment_id)): Path<(String, String, String)>,
) -> AppResult<Json<Comment>> {
    let conn = state.db.get()?;
    Ok(Json(visible_comment(
        &conn,
        &user_id,
        &post_id,
        &comment_id,
        &caller,
    )?))
}

async fn update_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, comment_id)): Path<(String, String, String)>,
    JsonBody(edit): JsonBody<CommentEdit>,
) -> AppResult<Json<Comment>> {
    let conn = state.db.get()?;
    let comment = addressed_comment(&conn, &user_id, &post_id, &comment_id)?;
    authorize(&caller, Action::EditComment(&comment.author_id))?;
    Ok(Json(comments::update(&conn, &comment.comment_id, &edit.caption)?))
}

async fn delete_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, post_id, comment_id)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db.get()?;
    let comment = addressed_comment(&conn, &user_id, &post_id, &comment_id)?;
    authorize(&caller, Action::DeleteComment(&comment.author_id))?;
    comments::delete(&mut conn, &comment.comment_id)?;
    Ok(StatusCode::OK)
}
