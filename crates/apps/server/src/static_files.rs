use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::AppState;

/// Map a request path onto a file under `root`. Rejects anything that would
/// escape the root.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let rel = request_path.trim_start_matches('/');
    let rel = if rel.is_empty() { "index.html" } else { rel };
    let mut out = root.to_path_buf();
    for comp in Path::new(rel).components() {
        match comp {
            Component::Normal(part) => out.push(part),
            _ => return None,
        }
    }
    Some(out)
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(root) = state.static_root.as_deref() else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    let Some(path) = resolve(root, uri.path()) else {
        return (StatusCode::BAD_REQUEST, "invalid path").into_response();
    };
    serve_file(&path).await
}

pub async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(data) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type_for(path)),
            );
            (StatusCode::OK, headers, Body::from(data)).into_response()
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("static file missing: {path:?}");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
        Err(err) => {
            error!("file read failed: {path:?} -> {err}");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}
