//! Request extractors that build a [`RequestContext`] for each handler.

use super::error::WebError;
use super::state::AppState;
use crate::context::RequestContext;
use crate::core::ServiceError;
use async_trait::async_trait;
use axum::RequestPartsExt;
use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::collections::HashMap;
use tracing::trace;

/// Leases a session and wraps it in an anonymous context.
///
/// The context lives as long as the handler future, so a request dropped
/// mid-flight gives its session back with it.
#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let params = match parts.extract::<Path<HashMap<String, String>>>().await {
            Ok(Path(params)) => params,
            Err(_) => HashMap::new(),
        };

        let lease = state.pool.lease().await?;
        let ctx = RequestContext::new(lease).with_params(params);
        trace!(
            request_id = %ctx.request_id(),
            session_id = ?ctx.lease().session_id(),
            "session leased"
        );
        Ok(ctx)
    }
}

/// A context whose identity was resolved from basic-auth credentials.
#[derive(Debug)]
pub struct Authenticated(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state).await?;

        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| {
                ServiceError::Unauthorized("authorization header is not valid text".to_string())
            })?),
            None => None,
        };
        let identity = state.auth.resolve_header(ctx.session()?, header).await?;
        trace!(request_id = %ctx.request_id(), caller = identity.id(), "caller authenticated");

        Ok(Authenticated(ctx.with_identity(identity)))
    }
}
