use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub sign_up_date: String,
    pub last_seen_date: String,
    pub bio: String,
    pub profile_image: String,
    pub followers: i64,
    pub following: i64,
}

impl User {
    pub(crate) const COLUMNS: &'static str = "users.id, users.username, users.signup_date, \
         users.last_seen, users.bio, users.profile_image, users.followers_count, \
         users.following_count";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            user_id: row.get(0)?,
            username: row.get(1)?,
            sign_up_date: row.get(2)?,
            last_seen_date: row.get(3)?,
            bio: row.get(4)?,
            profile_image: row.get(5)?,
            followers: row.get(6)?,
            following: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub creation_date: String,
    pub caption: String,
    pub image: String,
    pub like_count: i64,
    pub comment_count: i64,
}

impl Post {
    pub(crate) const COLUMNS: &'static str = "posts.id, posts.author_id, posts.author_username, \
         posts.created_at, posts.caption, posts.image, posts.like_count, posts.comment_count";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Post {
            post_id: row.get(0)?,
            author_id: row.get(1)?,
            author_username: row.get(2)?,
            creation_date: row.get(3)?,
            caption: row.get(4)?,
            image: row.get(5)?,
            like_count: row.get(6)?,
            comment_count: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub creation_date: String,
    pub caption: String,
    pub like_count: i64,
}

impl Comment {
    pub(crate) const COLUMNS: &'static str = "comments.id, comments.post_id, comments.author_id, \
         comments.author_username, comments.created_at, comments.caption, comments.like_count";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Comment {
            comment_id: row.get(0)?,
            post_id: row.get(1)?,
            author_id: row.get(2)?,
            author_username: row.get(3)?,
            creation_date: row.get(4)?,
            caption: row.get(5)?,
            like_count: row.get(6)?,
        })
    }
}

/// A user liking a post or a comment. `resource_id` is the liked resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub resource_id: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub resource_id: String,
}

impl From<String> for ResourceId {
    fn from(resource_id: String) -> Self {
        Self { resource_id }
    }
}

// --- Collections ---

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCollection {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostStream {
    pub posts: Vec<ResourceId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentStream {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeCollection {
    pub likes: Vec<Like>,
}

// --- Request bodies ---

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub username: String,
}

/// Editable profile fields. Counters and dates are server-owned.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostDraft {
    pub caption: String,
    pub image: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub author_id: String,
    pub caption: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentEdit {
    pub caption: String,
}
