use rusqlite::Connection;

use super::Caller;
use crate::db::{bans, RepoResult};
use crate::error::{AppError, AppResult};

/// Whether `viewer_id` may see resources owned by `owner_id`: denied only
/// when the owner has banned the viewer. Owners always see their own.
pub fn can_view(conn: &Connection, owner_id: &str, viewer_id: &str) -> RepoResult<bool> {
    if owner_id == viewer_id {
        return Ok(true);
    }
    Ok(!bans::is_banned(conn, owner_id, viewer_id)?)
}

/// `can_view` for request handlers: a banned caller gets `Forbidden`.
pub fn ensure_can_view(conn: &Connection, owner_id: &str, caller: &Caller) -> AppResult<()> {
    if can_view(conn, owner_id, caller.as_str())? {
        Ok(())
    } else {
        tracing::debug!("{} is banned by {}", caller, owner_id);
        Err(AppError::Forbidden(format!(
            "You have been banned by user {}",
            owner_id
        )))
    }
}
