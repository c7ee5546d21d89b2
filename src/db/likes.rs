use rusqlite::{params, Connection};

use super::models::Like;
use super::{now, users, write_tx, RepoResult, RepositoryError};

/// The kind of resource a like points at. Posts and comments keep their
/// likes in separate tables but follow the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post,
    Comment,
}

impl LikeTarget {
    fn resource_table(self) -> &'static str {
        match self {
            LikeTarget::Post => "posts",
            LikeTarget::Comment => "comments",
        }
    }

    fn like_table(self) -> &'static str {
        match self {
            LikeTarget::Post => "post_likes",
            LikeTarget::Comment => "comment_likes",
        }
    }

    fn key_column(self) -> &'static str {
        match self {
            LikeTarget::Post => "post_id",
            LikeTarget::Comment => "comment_id",
        }
    }

    fn missing(self) -> RepositoryError {
        match self {
            LikeTarget::Post => RepositoryError::NotFound("post"),
            LikeTarget::Comment => RepositoryError::NotFound("comment"),
        }
    }

    fn target_exists(self, conn: &Connection, resource_id: &str) -> RepoResult<bool> {
        super::exists(
            conn,
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
                self.resource_table()
            ),
            resource_id,
        )
    }
}

pub fn has_liked(
    conn: &Connection,
    target: LikeTarget,
    resource_id: &str,
    user_id: &str,
) -> RepoResult<bool> {
    Ok(conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND user_id = ?2)",
            target.like_table(),
            target.key_column()
        ),
        params![resource_id, user_id],
        |row| row.get(0),
    )?)
}

/// Record a like and bump the target's like counter. Returns `false` when
/// the user had already liked the resource.
pub fn like(
    conn: &mut Connection,
    target: LikeTarget,
    resource_id: &str,
    liker_id: &str,
) -> RepoResult<bool> {
    let created = write_tx(conn, |tx| {
        if !target.target_exists(tx, resource_id)? {
            return Err(target.missing());
        }
        let liker = users::get(tx, liker_id)?;

        let inserted = tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, user_id, username, created_at) VALUES (?1, ?2, ?3, ?4)",
                target.like_table(),
                target.key_column()
            ),
            params![resource_id, liker.user_id, liker.username, now()],
        )?;
        if inserted == 0 {
            return Ok(false);
        }
        tx.execute(
            &format!(
                "UPDATE {} SET like_count = like_count + 1 WHERE id = ?1",
                target.resource_table()
            ),
            params![resource_id],
        )?;
        Ok(true)
    })?;

    if created {
        tracing::debug!("{} liked {:?} {}", liker_id, target, resource_id);
    }
    Ok(created)
}

/// Remove a like and decrement the counter. Returns `false` when there was
/// no like to remove.
pub fn unlike(
    conn: &mut Connection,
    target: LikeTarget,
    resource_id: &str,
    liker_id: &str,
) -> RepoResult<bool> {
    let removed = write_tx(conn, |tx| {
        if !target.target_exists(tx, resource_id)? {
            return Err(target.missing());
        }
        let deleted = tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND user_id = ?2",
                target.like_table(),
                target.key_column()
            ),
            params![resource_id, liker_id],
        )?;
        if deleted == 0 {
            return Ok(false);
        }
        tx.execute(
            &format!(
                "UPDATE {} SET like_count = like_count - 1 WHERE id = ?1",
                target.resource_table()
            ),
            params![resource_id],
        )?;
        Ok(true)
    })?;

    if removed {
        tracing::debug!("{} unliked {:?} {}", liker_id, target, resource_id);
    }
    Ok(removed)
}

/// Likes on a resource, oldest first, without likers who have banned
/// `viewer_id`.
pub fn list(
    conn: &Connection,
    target: LikeTarget,
    resource_id: &str,
    viewer_id: &str,
) -> RepoResult<Vec<Like>> {
    let table = target.like_table();
    let key = target.key_column();
    let mut stmt = conn.prepare(&format!(
        "SELECT {key}, user_id, username FROM {table}
         WHERE {key} = ?1
           AND NOT EXISTS (
               SELECT 1 FROM bans
               WHERE bans.user_id = {table}.user_id AND bans.banned_user_id = ?2
           )
         ORDER BY created_at, rowid"
    ))?;
    let likes = stmt
        .query_map(params![resource_id, viewer_id], |row| {
            Ok(Like {
                resource_id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(likes)
}
