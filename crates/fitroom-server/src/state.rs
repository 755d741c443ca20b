//! Shared handler state and request authentication.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fitroom_application::CallUseCase;
use fitroom_core::FitroomError;
use fitroom_infrastructure::BroadcastEventPublisher;
use std::sync::Arc;

use crate::error::ApiError;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub calls: Arc<CallUseCase>,
    pub events: Arc<BroadcastEventPublisher>,
}

/// The acting user, taken from the `x-user-id` header.
///
/// Real authentication is owned by the platform gateway; this service only
/// needs the caller's identity.
pub struct UserId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError(FitroomError::validation("missing x-user-id header")))?;
        Ok(UserId(user_id.to_string()))
    }
}
