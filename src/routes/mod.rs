//! Route tables. `app_router` assembles the full application.

mod admin;
mod api;
mod common;

pub use admin::{admin_routes, ADMIN_BODY_LIMIT};
pub use api::api_routes;
pub use common::common_routes;

use crate::handlers::forward;
use crate::state::AppState;
use axum::Router;

/// `/admin/*` admin API, `/api/posts`, and everything else proxied to the front-end.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/admin", admin_routes())
        .merge(api_routes())
        .fallback(forward)
        .with_state(state)
}
