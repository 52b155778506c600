//! Catch-all forwarding to the front-end dev server.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};

/// Largest request body relayed upstream.
pub const MAX_PROXY_BODY: usize = 25 * 1024 * 1024;

const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for h in HOP_BY_HOP {
        headers.remove(h);
    }
    headers.remove("keep-alive");
    headers.remove(header::CONTENT_LENGTH);
}

fn unreachable(upstream: &str, error: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("No response from front-end at {}, did you start it? {}", upstream, error),
    )
        .into_response()
}

/// Relay method, path, query, headers and body to `FRONTEND_URL`, then relay the answer back.
/// Any path starting with the panel's base URL (`/adminx` included) is answered here, never relayed.
pub async fn forward(State(state): State<AppState>, req: Request) -> Response {
    let path = req.uri().path();
    if path.starts_with(state.panel.base_url.as_str()) {
        return AppError::NotFound(format!("no admin route for {}", path)).into_response();
    }
    let upstream = state.settings.frontend_url.as_str();
    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", upstream, path_and_query);

    let body = match axum::body::to_bytes(body, MAX_PROXY_BODY).await {
        Ok(b) => b,
        Err(e) => return (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response(),
    };
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);

    tracing::debug!(method = %parts.method, %url, "proxy");
    let resp = match state
        .http
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(%upstream, error = %e, "front-end unreachable");
            return unreachable(upstream, e);
        }
    };

    let status = resp.status();
    tracing::info!(%status, %url, "proxied");
    let mut out_headers = resp.headers().clone();
    strip_hop_by_hop(&mut out_headers);
    let bytes = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => return unreachable(upstream, e),
    };
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = out_headers;
    response
}
