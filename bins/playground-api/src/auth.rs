// Identity extraction
// The session layer in front of the API authenticates the user and forwards
// their id in a header; no header means an anonymous caller.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use playground_common::types::UserId;
use std::convert::Infallible;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<UserId>);

impl CurrentUser {
    pub fn user(&self) -> Option<&UserId> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(UserId::new);

        Ok(CurrentUser(user))
    }
}
