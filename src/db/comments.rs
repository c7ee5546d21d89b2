use rusqlite::{params, Connection, OptionalExtension};

use super::models::Comment;
use super::{new_id, now, posts, users, write_tx, RepoResult, RepositoryError};

pub const CAPTION_MAX: usize = 2000;

fn validate_caption(caption: &str) -> RepoResult<()> {
    if caption.trim().is_empty() {
        return Err(RepositoryError::Invalid("Comment cannot be empty".into()));
    }
    if caption.chars().count() > CAPTION_MAX {
        return Err(RepositoryError::Invalid(format!(
            "Comment must be {} characters or less",
            CAPTION_MAX
        )));
    }
    Ok(())
}

pub fn exists(conn: &Connection, comment_id: &str) -> RepoResult<bool> {
    super::exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM comments WHERE id = ?1)",
        comment_id,
    )
}

pub fn get(conn: &Connection, comment_id: &str) -> RepoResult<Comment> {
    conn.query_row(
        &format!("SELECT {} FROM comments WHERE id = ?1", Comment::COLUMNS),
        params![comment_id],
        Comment::from_row,
    )
    .optional()?
    .ok_or(RepositoryError::NotFound("comment"))
}

/// Fetch a comment addressed through its parent post.
pub fn get_in_post(conn: &Connection, post_id: &str, comment_id: &str) -> RepoResult<Comment> {
    let comment = get(conn, comment_id)?;
    if comment.post_id != post_id {
        return Err(RepositoryError::NotFound("comment"));
    }
    Ok(comment)
}

/// Add a comment under `post_id` and bump the post's comment counter.
pub fn create(
    conn: &mut Connection,
    post_id: &str,
    author_id: &str,
    caption: &str,
) -> RepoResult<Comment> {
    validate_caption(caption)?;

    let comment = write_tx(conn, |tx| {
        if !posts::exists(tx, post_id)? {
            return Err(RepositoryError::NotFound("post"));
        }
        let author = users::get(tx, author_id)?;

        let id = new_id();
        tx.execute(
            "INSERT INTO comments (id, post_id, author_id, author_username, created_at, caption)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, post_id, author.user_id, author.username, now(), caption],
        )?;
        tx.execute(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?1",
            params![post_id],
        )?;
        get(tx, &id)
    })?;

    tracing::info!("Created comment {} on post {}", comment.comment_id, post_id);
    Ok(comment)
}

pub fn update(conn: &Connection, comment_id: &str, caption: &str) -> RepoResult<Comment> {
    validate_caption(caption)?;
    let rows = conn.execute(
        "UPDATE comments SET caption = ?1 WHERE id = ?2",
        params![caption, comment_id],
    )?;
    if rows == 0 {
        return Err(RepositoryError::NotFound("comment"));
    }
    get(conn, comment_id)
}

/// Remove a comment (and its likes) and decrement the parent post's
/// comment counter.
pub fn delete(conn: &mut Connection, comment_id: &str) -> RepoResult<()> {
    write_tx(conn, |tx| {
        let post_id: String = tx
            .query_row(
                "SELECT post_id FROM comments WHERE id = ?1",
                params![comment_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepositoryError::NotFound("comment"))?;

        tx.execute("DELETE FROM comments WHERE id = ?1", params![comment_id])?;
        tx.execute(
            "UPDATE posts SET comment_count = comment_count - 1 WHERE id = ?1",
            params![post_id],
        )?;
        Ok(())
    })?;

    tracing::info!("Deleted comment {}", comment_id);
    Ok(())
}

/// Comments on `post_id`, oldest first, without those written by users who
/// have banned `viewer_id`.
pub fn list_for_post(conn: &Connection, post_id: &str, viewer_id: &str) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM comments
         WHERE comments.post_id = ?1
           AND NOT EXISTS (
               SELECT 1 FROM bans
               WHERE bans.user_id = comments.author_id AND bans.banned_user_id = ?2
           )
         ORDER BY comments.created_at, comments.rowid",
        Comment::COLUMNS
    ))?;
    let comments = stmt
        .query_map(params![post_id, viewer_id], Comment::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}
