//! Resolve the authenticated admin from `Authorization: Basic ...`.

use crate::auth::{authenticate, AdminUser};
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Extractor for admin-only handlers. Rejects with 401 and a Basic challenge.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub AdminUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = authenticate(&state.panel, &state.data_sources, &parts.headers).await?;
        Ok(AuthenticatedUser(user))
    }
}
