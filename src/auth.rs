//! Admin authentication: HTTP Basic credentials checked against the users resource.

use crate::config::AdminPanel;
use crate::error::AppError;
use crate::store::{DataSources, Filter, ListQuery, Record};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::{header, HeaderMap};
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

/// The signed-in admin, resolved once per request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub pk: Value,
    pub username: String,
    /// Stored user row. The hash column is removed before this leaves the server.
    #[serde(skip)]
    pub db_user: Record,
}

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

/// False for a wrong password and for a malformed hash.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// `Authorization: Basic base64(user:pass)` -> `(user, pass)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Resolve the request's admin. Usernames compare lowercased.
pub async fn authenticate(panel: &AdminPanel, sources: &DataSources, headers: &HeaderMap) -> Result<AdminUser, AppError> {
    let (username, password) =
        basic_credentials(headers).ok_or_else(|| AppError::Unauthorized("missing credentials".into()))?;
    let username = username.trim().to_lowercase();

    let users = panel
        .users_resource()
        .ok_or_else(|| AppError::NotFound(format!("resource {}", panel.auth.users_resource_id)))?;
    let store = sources.for_resource(users)?;
    let query = ListQuery {
        limit: Some(1),
        ..ListQuery::filtered(vec![Filter::Eq(
            panel.auth.username_column.clone(),
            Value::String(username.clone()),
        )])
    };
    let mut db_user = store
        .list(users, &query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;

    let hash = db_user
        .remove(&panel.auth.password_hash_column)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .unwrap_or(false);
    if !ok {
        tracing::debug!(%username, "admin login failed");
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }

    let pk_name = &users.primary_key()?.name;
    Ok(AdminUser {
        pk: db_user.get(pk_name).cloned().unwrap_or(Value::Null),
        username,
        db_user,
    })
}
