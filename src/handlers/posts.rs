//! Public posts endpoint.

use crate::error::AppError;
use crate::service::{PostService, PostsQuery};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

/// `GET /api/posts`: a bare JSON array, not the admin envelope.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let storage = state.settings.storage();
    let posts = PostService::list(&state.panel, &state.data_sources, &storage, &query).await?;
    Ok(Json(posts.into_iter().map(Value::Object).collect()))
}
