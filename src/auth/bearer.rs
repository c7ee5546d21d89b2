use axum::http::{header, HeaderMap};

use super::{AuthError, Caller};

pub const SCHEME: &str = "Bearer";

/// Parse an `Authorization` header value of exactly `Bearer <token>`.
///
/// The token is the caller's user id; nothing else is verified.
pub fn parse_bearer(value: Option<&str>) -> Result<Caller, AuthError> {
    let value = value.ok_or(AuthError::MissingHeader)?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if scheme != SCHEME {
        return Err(AuthError::Malformed);
    }
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    if token.chars().any(char::is_whitespace) {
        return Err(AuthError::Malformed);
    }
    Ok(Caller::new(token))
}

/// Resolve the caller from request headers. A header that is not valid
/// visible ASCII counts as malformed.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, AuthError> {
    match headers.get(header::AUTHORIZATION) {
        None => Err(AuthError::MissingHeader),
        Some(value) => parse_bearer(Some(value.to_str().map_err(|_| AuthError::Malformed)?)),
    }
}
