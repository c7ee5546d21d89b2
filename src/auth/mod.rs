pub mod bearer;
pub mod ownership;
pub mod visibility;

use std::fmt;
use thiserror::Error;

pub use bearer::parse_bearer;
pub use ownership::{authorize, Action};
pub use visibility::{can_view, ensure_can_view};

/// The identity behind a request: the bearer token, which is the caller's
/// user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    Malformed,

    #[error("Bearer token is empty")]
    EmptyToken,

    #[error("Not allowed to {action} as {required}")]
    Forbidden {
        action: &'static str,
        required: String,
    },
}
