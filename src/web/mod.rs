//! HTTP boundary.
//!
//! Every route is served under `/v1`. Handlers receive a [`RequestContext`]
//! (or an [`Authenticated`] one on protected routes) built by the extractors
//! in [`extract`], and every failure is rendered by [`WebError`].
//!
//! [`RequestContext`]: crate::context::RequestContext

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use error::{ErrorBody, WebError, WebResult};
pub use extract::Authenticated;
pub use state::AppState;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/user", post(handlers::create_user))
        .route("/user/:user_id/confirm", get(handlers::confirm_user))
        .route("/profile", put(handlers::update_profile))
        .route("/profile/all", get(handlers::all_profiles))
        .route("/profile/:profile_id", get(handlers::get_profile))
        .route("/profile/:profile_id/history", get(handlers::profile_history));

    Router::new()
        .nest("/v1", api)
        .layer(axum::middleware::from_fn(middleware::require_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
