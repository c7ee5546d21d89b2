use rusqlite::{params, Connection, OptionalExtension};

use super::models::{ProfileUpdate, User};
use super::{new_id, now, write_tx, RepoResult, RepositoryError};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 16;

/// Usernames are 3 to 16 characters with no whitespace.
pub fn validate_username(username: &str) -> RepoResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(RepositoryError::Invalid(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(RepositoryError::Invalid(
            "Username cannot contain whitespace".into(),
        ));
    }
    Ok(())
}

pub fn exists(conn: &Connection, user_id: &str) -> RepoResult<bool> {
    super::exists(conn, "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", user_id)
}

pub fn get(conn: &Connection, user_id: &str) -> RepoResult<User> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
        params![user_id],
        User::from_row,
    )
    .optional()?
    .ok_or(RepositoryError::NotFound("user"))
}

pub fn find_by_username(conn: &Connection, username: &str) -> RepoResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS),
            params![username],
            User::from_row,
        )
        .optional()?)
}

fn insert(conn: &Connection, username: &str) -> RepoResult<User> {
    let id = new_id();
    let timestamp = now();
    conn.execute(
        "INSERT INTO users (id, username, signup_date, last_seen) VALUES (?1, ?2, ?3, ?3)",
        params![id, username, timestamp],
    )?;
    get(conn, &id)
}

/// Create a user. Fails with `Conflict` when the username is taken.
pub fn create(conn: &mut Connection, username: &str) -> RepoResult<User> {
    validate_username(username)?;
    write_tx(conn, |tx| {
        if find_by_username(tx, username)?.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        insert(tx, username)
    })
}

/// Log in by username, creating the account on first use.
///
/// Returns the user and whether it was created by this call. Logging in to
/// an existing account refreshes its last-seen timestamp.
pub fn login(conn: &mut Connection, username: &str) -> RepoResult<(User, bool)> {
    validate_username(username)?;
    write_tx(conn, |tx| match find_by_username(tx, username)? {
        Some(user) => {
            tx.execute(
                "UPDATE users SET last_seen = ?1 WHERE id = ?2",
                params![now(), user.user_id],
            )?;
            Ok((get(tx, &user.user_id)?, false))
        }
        None => {
            let user = insert(tx, username)?;
            tracing::info!("Created user {} ({})", user.username, user.user_id);
            Ok((user, true))
        }
    })
}

/// Users whose username contains `query` (case-insensitive), hiding anyone
/// who has banned `viewer_id`.
pub fn search(conn: &Connection, query: &str, viewer_id: &str) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users
         WHERE instr(lower(users.username), lower(?1)) > 0
           AND NOT EXISTS (
               SELECT 1 FROM bans
               WHERE bans.user_id = users.id AND bans.banned_user_id = ?2
           )
         ORDER BY users.username",
        User::COLUMNS
    ))?;
    let users = stmt
        .query_map(params![query, viewer_id], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Replace the editable profile fields. A username change is propagated to
/// the denormalized author and liker names in the same transaction.
pub fn update(conn: &mut Connection, user_id: &str, update: &ProfileUpdate) -> RepoResult<User> {
    validate_username(&update.username)?;
    write_tx(conn, |tx| {
        let current = get(tx, user_id)?;

        if current.username != update.username {
            if find_by_username(tx, &update.username)?.is_some() {
                return Err(RepositoryError::Conflict(format!(
                    "Username '{}' is already taken",
                    update.username
                )));
            }
            for sql in [
                "UPDATE posts SET author_username = ?1 WHERE author_id = ?2",
                "UPDATE comments SET author_username = ?1 WHERE author_id = ?2",
                "UPDATE post_likes SET username = ?1 WHERE user_id = ?2",
                "UPDATE comment_likes SET username = ?1 WHERE user_id = ?2",
            ] {
                tx.execute(sql, params![update.username, user_id])?;
            }
        }

        tx.execute(
            "UPDATE users SET username = ?1, bio = ?2, profile_image = ?3 WHERE id = ?4",
            params![update.username, update.bio, update.profile_image, user_id],
        )?;
        get(tx, user_id)
    })
}

/// Delete the user row only. Posts, comments, likes and edges that
/// reference the user are left in place.
pub fn delete(conn: &Connection, user_id: &str) -> RepoResult<()> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    if rows == 0 {
        return Err(RepositoryError::NotFound("user"));
    }
    tracing::info!("Deleted user {}", user_id);
    Ok(())
}
