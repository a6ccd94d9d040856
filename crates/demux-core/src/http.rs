//! HTTP - axum middleware
//!
//! - path が一致しない / method が一致しない → 次の service にそのまま渡す
//! - `OPTIONS` → CORS preflight (200, 空 body)
//! - 一致 → payload を取り出して dispatch し、ResultItem の配列を JSON で返す
//! - payload が配列でない等 → 400
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/health", get(health))
//!     .fallback(not_found);
//! let app = demux_core::http::attach(app, demux);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{self, Body};
use axum::extract::{Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::app::{Demux, DemuxConfig, HttpMethod};
use crate::domain::BatchError;

/// Query parameter holding the JSON batch for `GET` endpoints.
pub const BATCH_QUERY_PARAM: &str = "batch";

/// Wrap `router` so that the configured endpoint is served by `demux`.
///
/// Routes must be added before calling this; the middleware only sees
/// requests that reach an existing route or the fallback.
pub fn attach<S>(router: Router<S>, demux: Arc<Demux>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(demux, demux_middleware))
}

/// A router that serves only the demux endpoint and answers 404 otherwise.
pub fn router(demux: Arc<Demux>) -> Router {
    attach(Router::new().fallback(not_found), demux)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// 設定された path/method のリクエストを `Demux` で処理する middleware
pub async fn demux_middleware(
    State(demux): State<Arc<Demux>>,
    request: Request,
    next: Next,
) -> Response {
    let config = demux.config();
    if request.uri().path() != config.path {
        return next.run(request).await;
    }
    if request.method() == Method::OPTIONS {
        return preflight(config.method);
    }
    if request.method() != config.method.as_http() {
        return next.run(request).await;
    }

    let payload = match read_payload(request, config).await {
        Ok(payload) => payload,
        Err(err) => return bad_request(err),
    };
    match demux.handle(payload).await {
        Ok(results) => with_cors(Json(results).into_response()),
        Err(err) => bad_request(err),
    }
}

async fn read_payload(request: Request, config: &DemuxConfig) -> Result<Value, BatchError> {
    match config.method {
        HttpMethod::Post => {
            let bytes = body::to_bytes(request.into_body(), config.body_limit)
                .await
                .map_err(|e| BatchError::Body(e.to_string()))?;
            Ok(serde_json::from_slice(&bytes)?)
        }
        HttpMethod::Get => {
            let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
                .map_err(|e| BatchError::InvalidJson(e.to_string()))?;
            let raw = params
                .get(BATCH_QUERY_PARAM)
                .ok_or(BatchError::MissingQuery(BATCH_QUERY_PARAM))?;
            Ok(serde_json::from_str(raw)?)
        }
    }
}

fn preflight(method: HttpMethod) -> Response {
    debug!(%method, "answering CORS preflight");
    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(method.as_str()),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    response
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    response
}

fn bad_request(err: BatchError) -> Response {
    warn!(error = %err, "rejected batch");
    let body = Json(json!({"success": false, "message": err.to_string()}));
    with_cors((StatusCode::BAD_REQUEST, body).into_response())
}
