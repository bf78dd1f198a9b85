use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, error};

use crate::AppState;

/// Request headers passed through to the backend.
const FORWARDED_REQUEST_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::ACCEPT];

/// Response headers passed back to the client.
const FORWARDED_RESPONSE_HEADERS: [header::HeaderName; 3] =
    [header::CONTENT_TYPE, header::CACHE_CONTROL, header::ETAG];

pub fn upstream_url(backend_url: &str, uri: &Uri) -> String {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}{}", backend_url.trim_end_matches('/'), path)
}

pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let url = upstream_url(&state.backend_url, &uri);
    debug!(%method, %url, "forwarding");

    let mut req = state.http.request(method.clone(), &url);
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = headers.get(&name) {
            req = req.header(name, value.clone());
        }
    }
    if !body.is_empty() {
        req = req.body(body);
    }

    match req.send().await {
        Ok(resp) => map_proxy_response(resp).await,
        Err(err) => {
            error!("backend {method} {url} failed: {err}");
            (StatusCode::BAD_GATEWAY, "backend unavailable").into_response()
        }
    }
}

async fn map_proxy_response(resp: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut headers = HeaderMap::new();
    for name in FORWARDED_RESPONSE_HEADERS {
        if let Some(value) = resp.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
    }

    match resp.bytes().await {
        Ok(bytes) => (status, headers, Body::from(bytes)).into_response(),
        Err(err) => {
            error!("proxy response read failed: {err}");
            (StatusCode::BAD_GATEWAY, "backend unavailable").into_response()
        }
    }
}
