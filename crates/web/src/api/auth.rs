//! Caller identity.
//!
//! The upstream auth layer authenticates the member and forwards the
//! numeric id in `x-user-id`. Requests without a usable id get a 401.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use learn_core::model::UserId;

use super::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated member making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        raw.parse::<UserId>()
            .map(CurrentUser)
            .map_err(|_| ApiError::Unauthorized)
    }
}
