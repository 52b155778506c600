//! Admin API handlers: panel configuration, resource metadata, record CRUD and upload paths.

use crate::error::{AppError, PluginError};
use crate::extractors::AuthenticatedUser;
use crate::response::{success_created, success_many, success_one};
use crate::service::RecordService;
use crate::state::AppState;
use crate::store::Record;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

fn body_to_record(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Login page configuration. Public.
pub async fn public_config(State(state): State<AppState>) -> Response {
    success_one(state.panel.public_config()).into_response()
}

/// The signed-in admin, with the stored row sanitised like any other record.
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = state.resource(&state.panel.auth.users_resource_id)?;
    Ok(success_one(serde_json::json!({
        "pk": user.pk,
        "username": user.username,
        "dbUser": users.present(user.db_user),
    })))
}

pub async fn list_resources(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Response {
    let metas: Vec<_> = state.panel.resources.iter().map(|r| r.meta()).collect();
    success_many(metas).into_response()
}

pub async fn get_resource(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(resource_id): Path<String>,
) -> Result<Response, AppError> {
    let resource = state.resource(&resource_id)?;
    Ok(success_one(resource.meta()).into_response())
}

pub async fn list_records(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(resource_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_id)?;
    let store = state.store_for(resource)?;
    let rows = RecordService::list(resource, store.as_ref(), &params).await?;
    Ok(success_many(rows))
}

pub async fn create_record(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(resource_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_id)?;
    let store = state.store_for(resource)?;
    let input = body_to_record(body)?;
    let created = RecordService::create(resource, store.as_ref(), &user, input).await?;
    Ok(success_created(created))
}

pub async fn get_record(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path((resource_id, pk)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_id)?;
    let store = state.store_for(resource)?;
    let row = RecordService::read(resource, store.as_ref(), &pk).await?;
    Ok(success_one(row))
}

pub async fn update_record(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((resource_id, pk)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_id)?;
    let store = state.store_for(resource)?;
    let input = body_to_record(body)?;
    let updated = RecordService::update(resource, store.as_ref(), &user, &pk, input).await?;
    Ok(success_one(updated))
}

pub async fn delete_record(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((resource_id, pk)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_id)?;
    let store = state.store_for(resource)?;
    let deleted = RecordService::delete(resource, store.as_ref(), &user, &pk).await?;
    Ok(success_one(deleted))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub column: String,
    pub original_filename: String,
    pub original_extension: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub path: String,
    pub preview_url: String,
}

/// Derive the storage key for a new upload. The transfer itself happens client-side.
pub async fn upload_path(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(resource_id): Path<String>,
    Json(req): Json<UploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.resource(&resource_id)?;
    let plugin = resource
        .upload_plugin(&req.column)
        .ok_or_else(|| PluginError::NoUploadTarget(resource.id.clone(), req.column.clone()))?;
    let path = plugin.storage_path(&req.original_filename, &req.original_extension, req.size)?;
    tracing::info!(resource = %resource.id, column = %req.column, actor = %user.username, %path, "upload path issued");
    Ok(success_one(UploadTarget {
        preview_url: plugin.storage.object_url(&path),
        path,
    }))
}
