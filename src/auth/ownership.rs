use super::{AuthError, Caller};

/// A write operation together with the identity it must be performed as.
///
/// Each variant carries the id the caller has to match: the profile owner,
/// the post or comment author, the liker, the follower, the banning user or
/// the photo owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    EditProfile(&'a str),
    DeleteProfile(&'a str),
    CreatePost(&'a str),
    EditPost(&'a str),
    DeletePost(&'a str),
    CreateComment(&'a str),
    EditComment(&'a str),
    DeleteComment(&'a str),
    Like(&'a str),
    Unlike(&'a str),
    Follow(&'a str),
    Unfollow(&'a str),
    Ban(&'a str),
    Unban(&'a str),
    ListBanned(&'a str),
    UploadPhoto(&'a str),
    DeletePhoto(&'a str),
    ReadFeed(&'a str),
}

impl<'a> Action<'a> {
    pub fn required_identity(&self) -> &'a str {
        match *self {
            Action::EditProfile(id)
            | Action::DeleteProfile(id)
            | Action::CreatePost(id)
            | Action::EditPost(id)
            | Action::DeletePost(id)
            | Action::CreateComment(id)
            | Action::EditComment(id)
            | Action::DeleteComment(id)
            | Action::Like(id)
            | Action::Unlike(id)
            | Action::Follow(id)
            | Action::Unfollow(id)
            | Action::Ban(id)
            | Action::Unban(id)
            | Action::ListBanned(id)
            | Action::UploadPhoto(id)
            | Action::DeletePhoto(id)
            | Action::ReadFeed(id) => id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::EditProfile(_) => "edit profile",
            Action::DeleteProfile(_) => "delete profile",
            Action::CreatePost(_) => "create post",
            Action::EditPost(_) => "edit post",
            Action::DeletePost(_) => "delete post",
            Action::CreateComment(_) => "create comment",
            Action::EditComment(_) => "edit comment",
            Action::DeleteComment(_) => "delete comment",
            Action::Like(_) => "like",
            Action::Unlike(_) => "unlike",
            Action::Follow(_) => "follow",
            Action::Unfollow(_) => "unfollow",
            Action::Ban(_) => "ban",
            Action::Unban(_) => "unban",
            Action::ListBanned(_) => "list banned users",
            Action::UploadPhoto(_) => "upload photo",
            Action::DeletePhoto(_) => "delete photo",
            Action::ReadFeed(_) => "read feed",
        }
    }
}

/// The single ownership check: the caller must be the identity the action
/// is performed as.
pub fn authorize(caller: &Caller, action: Action<'_>) -> Result<(), AuthError> {
    let required = action.required_identity();
    if caller.as_str() == required {
        return Ok(());
    }
    tracing::debug!("{} denied: {} is not {}", action.name(), caller, required);
    Err(AuthError::Forbidden {
        action: action.name(),
        required: required.to_string(),
    })
}
