use rusqlite::{params, Connection};

use super::models::User;
use super::{now, users, write_tx, RepoResult, RepositoryError};

pub fn is_following(conn: &Connection, follower_id: &str, following_id: &str) -> RepoResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2)",
        params![follower_id, following_id],
        |row| row.get(0),
    )?)
}

/// Add the edge `follower_id -> following_id` and bump both counters.
///
/// Returns `false` without touching anything when the edge already exists.
pub fn follow(conn: &mut Connection, follower_id: &str, following_id: &str) -> RepoResult<bool> {
    if follower_id == following_id {
        return Err(RepositoryError::Invalid("Users cannot follow themselves".into()));
    }

    let created = write_tx(conn, |tx| {
        if !users::exists(tx, follower_id)? || !users::exists(tx, following_id)? {
            return Err(RepositoryError::NotFound("user"));
        }
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
            params![follower_id, following_id, now()],
        )?;
        if inserted == 0 {
            return Ok(false);
        }
        tx.execute(
            "UPDATE users SET following_count = following_count + 1 WHERE id = ?1",
            params![follower_id],
        )?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count + 1 WHERE id = ?1",
            params![following_id],
        )?;
        Ok(true)
    })?;

    if created {
        tracing::info!("{} followed {}", follower_id, following_id);
    }
    Ok(created)
}

/// Remove the edge and decrement both counters. Returns `false` when there
/// was nothing to remove.
pub fn unfollow(conn: &mut Connection, follower_id: &str, following_id: &str) -> RepoResult<bool> {
    let removed = write_tx(conn, |tx| {
        let deleted = tx.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
        )?;
        if deleted == 0 {
            return Ok(false);
        }
        tx.execute(
            "UPDATE users SET following_count = following_count - 1 WHERE id = ?1",
            params![follower_id],
        )?;
        tx.execute(
            "UPDATE users SET followers_count = followers_count - 1 WHERE id = ?1",
            params![following_id],
        )?;
        Ok(true)
    })?;

    if removed {
        tracing::info!("{} unfollowed {}", follower_id, following_id);
    }
    Ok(removed)
}

/// Users following `user_id`, minus anyone who has banned `viewer_id`.
pub fn followers(conn: &Connection, user_id: &str, viewer_id: &str) -> RepoResult<Vec<User>> {
    list(
        conn,
        "JOIN follows ON follows.follower_id = users.id WHERE follows.following_id = ?1",
        user_id,
        viewer_id,
    )
}

/// Users `user_id` follows, minus anyone who has banned `viewer_id`.
pub fn following(conn: &Connection, user_id: &str, viewer_id: &str) -> RepoResult<Vec<User>> {
    list(
        conn,
        "JOIN follows ON follows.following_id = users.id WHERE follows.follower_id = ?1",
        user_id,
        viewer_id,
    )
}

fn list(conn: &Connection, join: &str, user_id: &str, viewer_id: &str) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users {}
           AND NOT EXISTS (
               SELECT 1 FROM bans
               WHERE bans.user_id = users.id AND bans.banned_user_id = ?2
           )
         ORDER BY follows.created_at, follows.rowid",
        User::COLUMNS,
        join
    ))?;
    let users = stmt
        .query_map(params![user_id, viewer_id], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
