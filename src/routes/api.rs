//! Public read API.

use crate::handlers::list_posts;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/api/posts", get(list_posts))
}
