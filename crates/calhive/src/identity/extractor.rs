//! Axum extractor for the authenticated caller.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use calhive_core::calendar::User;

use crate::context::RequestContext;
use crate::handlers::AppError;
use crate::state::AppState;

/// The authenticated caller. Rejects the request with 401 when the bearer
/// tokens are missing or invalid.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let RequestContext(ctx) = RequestContext::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        let user = app_state
            .identity
            .authenticate(&ctx, &parts.headers)
            .await?;

        tracing::debug!(user_id = %user.user_id, "Authenticated request");
        Ok(CurrentUser(user))
    }
}
