use rusqlite::{params, Connection};

use super::models::User;
use super::{now, users, write_tx, RepoResult, RepositoryError};

/// True if `user_id` has banned `banned_id`.
pub fn is_banned(conn: &Connection, user_id: &str, banned_id: &str) -> RepoResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM bans WHERE user_id = ?1 AND banned_user_id = ?2)",
        params![user_id, banned_id],
        |row| row.get(0),
    )?)
}

/// Record that `user_id` bans `banned_id`. Returns `false` if the ban was
/// already in place.
pub fn ban(conn: &mut Connection, user_id: &str, banned_id: &str) -> RepoResult<bool> {
    if user_id == banned_id {
        return Err(RepositoryError::Invalid("Users cannot ban themselves".into()));
    }

    let created = write_tx(conn, |tx| {
        if !users::exists(tx, user_id)? || !users::exists(tx, banned_id)? {
            return Err(RepositoryError::NotFound("user"));
        }
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO bans (user_id, banned_user_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, banned_id, now()],
        )?;
        Ok(inserted > 0)
    })?;

    if created {
        tracing::info!("{} banned {}", user_id, banned_id);
    }
    Ok(created)
}

/// Lift a ban. Returns `false` if there was none.
pub fn unban(conn: &Connection, user_id: &str, banned_id: &str) -> RepoResult<bool> {
    let deleted = conn.execute(
        "DELETE FROM bans WHERE user_id = ?1 AND banned_user_id = ?2",
        params![user_id, banned_id],
    )?;
    if deleted > 0 {
        tracing::info!("{} unbanned {}", user_id, banned_id);
    }
    Ok(deleted > 0)
}

/// Users banned by `user_id`, oldest ban first.
pub fn banned_users(conn: &Connection, user_id: &str) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users
         JOIN bans ON bans.banned_user_id = users.id
         WHERE bans.user_id = ?1
         ORDER BY bans.created_at, bans.rowid",
        User::COLUMNS
    ))?;
    let users = stmt
        .query_map(params![user_id], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
