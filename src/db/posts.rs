use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Post, PostDraft};
use super::{new_id, now, users, write_tx, RepoResult, RepositoryError};

pub fn exists(conn: &Connection, post_id: &str) -> RepoResult<bool> {
    super::exists(conn, "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)", post_id)
}

pub fn get(conn: &Connection, post_id: &str) -> RepoResult<Post> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE id = ?1", Post::COLUMNS),
        params![post_id],
        Post::from_row,
    )
    .optional()?
    .ok_or(RepositoryError::NotFound("post"))
}

/// Fetch a post addressed through its author. A post that exists under a
/// different author is reported as not found.
pub fn get_owned(conn: &Connection, author_id: &str, post_id: &str) -> RepoResult<Post> {
    let post = get(conn, post_id)?;
    if post.author_id != author_id {
        return Err(RepositoryError::NotFound("post"));
    }
    Ok(post)
}

pub fn create(conn: &mut Connection, author_id: &str, draft: &PostDraft) -> RepoResult<Post> {
    let post = write_tx(conn, |tx| {
        let author = users::get(tx, author_id)?;
        let id = new_id();
        tx.execute(
            "INSERT INTO posts (id, author_id, author_username, created_at, caption, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                author.user_id,
                author.username,
                now(),
                draft.caption,
                draft.image
            ],
        )?;
        get(tx, &id)
    })?;
    tracing::info!("Created post {} by {}", post.post_id, post.author_id);
    Ok(post)
}

/// Replace caption and image. Counters and authorship are not editable.
pub fn update(
    conn: &Connection,
    author_id: &str,
    post_id: &str,
    draft: &PostDraft,
) -> RepoResult<Post> {
    let rows = conn.execute(
        "UPDATE posts SET caption = ?1, image = ?2 WHERE id = ?3 AND author_id = ?4",
        params![draft.caption, draft.image, post_id, author_id],
    )?;
    if rows == 0 {
        return Err(RepositoryError::NotFound("post"));
    }
    get(conn, post_id)
}

/// Delete a post. Its comments and all likes on it go with it.
pub fn delete(conn: &Connection, author_id: &str, post_id: &str) -> RepoResult<()> {
    let rows = conn.execute(
        "DELETE FROM posts WHERE id = ?1 AND author_id = ?2",
        params![post_id, author_id],
    )?;
    if rows == 0 {
        return Err(RepositoryError::NotFound("post"));
    }
    tracing::info!("Deleted post {}", post_id);
    Ok(())
}

/// Post ids authored by `author_id`, newest first.
pub fn list_by_owner(conn: &Connection, author_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM posts WHERE author_id = ?1 ORDER BY created_at DESC, rowid DESC",
    )?;
    let ids = stmt
        .query_map(params![author_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Post ids authored by the accounts `user_id` follows, newest first with
/// later inserts winning ties. Authors who have banned `user_id` are
/// skipped.
pub fn feed(conn: &Connection, user_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT posts.id FROM posts
         JOIN follows ON follows.following_id = posts.author_id
         WHERE follows.follower_id = ?1
           AND NOT EXISTS (
               SELECT 1 FROM bans
               WHERE bans.user_id = posts.author_id AND bans.banned_user_id = ?1
           )
         ORDER BY posts.created_at DESC, posts.rowid DESC",
    )?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
