//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::AccountId;

use crate::error::ApiError;

/// Header carrying the authenticated account id, set by the gateway in
/// front of this service.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// The account making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub AccountId);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACCOUNT_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {ACCOUNT_HEADER} header")))?;

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(|id| Actor(AccountId::new(id)))
            .ok_or_else(|| ApiError::Unauthenticated(format!("invalid {ACCOUNT_HEADER} header")))
    }
}
