//! Admin API under `/admin`.

use crate::error::AppError;
use crate::handlers::{
    create_record, delete_record, get_record, get_resource, list_records, list_resources, me,
    public_config, update_record, upload_path,
};
use crate::routes::common_routes;
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, OriginalUri},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest JSON body the admin API accepts.
pub const ADMIN_BODY_LIMIT: usize = 10 * 1024 * 1024;

async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("no admin route for {}", uri.path()))
}

/// Admin routes, to be nested at `/admin`. Unknown paths answer 404 here instead of falling
/// through to the front-end proxy.
pub fn admin_routes() -> Router<AppState> {
    let api = Router::new()
        .route("/config", get(public_config))
        .route("/me", get(me))
        .route("/resources", get(list_resources))
        .route("/resources/:resource_id", get(get_resource))
        .route("/resources/:resource_id/records", get(list_records).post(create_record))
        .route(
            "/resources/:resource_id/records/:pk",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .route("/resources/:resource_id/upload", post(upload_path))
        .merge(common_routes());

    Router::new()
        .route("/", get(public_config))
        .nest("/api", api)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(ADMIN_BODY_LIMIT)),
        )
}
