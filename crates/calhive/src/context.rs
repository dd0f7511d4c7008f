//! Per-request [`OperationContext`].
//!
//! [`attach_context`] stamps every request with a context whose deadline is
//! counted from arrival; [`RequestContext`] hands it to handlers.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use calhive_core::OperationContext;

use crate::state::AppState;

/// The operation context of the current request.
#[derive(Debug, Clone)]
pub struct RequestContext(pub OperationContext);

/// Middleware inserting a fresh [`RequestContext`] into the request.
pub async fn attach_context(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(RequestContext(state.operation_context()));
    next.run(request).await
}

impl<S> FromRequestParts<S> for RequestContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        // Routes mounted without the middleware still get a deadline.
        Ok(RequestContext(AppState::from_ref(state).operation_context()))
    }
}
