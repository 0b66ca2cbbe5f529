use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE};
use axum::response::Response;
use axum::routing::{any, get};
use bytes::Bytes;
use futures_util::StreamExt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use azoai_core::endpoints::SUPPORTED_ENDPOINTS;
use azoai_core::{ProxyEngine, ProxyError, ProxyResponse, classify_request};

#[derive(Clone)]
struct ProxyState {
    engine: Arc<ProxyEngine>,
}

pub fn proxy_router(engine: Arc<ProxyEngine>) -> Router {
    // Let one byte past the configured bound through so the size check can
    // answer with the Azure envelope instead of a bare 413.
    let body_limit = engine.config().max_body_bytes.saturating_add(1);
    let state = ProxyState { engine };

    Router::new()
        .route("/health", get(health))
        .route(
            "/proxyapi/azurecom/openai/deployments/{deployment}/{*operation}",
            any(proxy_handler),
        )
        .fallback(unknown_route)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn proxy_handler(
    State(state): State<ProxyState>,
    Path((deployment, operation)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let started_at = Instant::now();

    let classified = match classify_request(
        &method,
        &deployment,
        &operation,
        uri.query(),
        &headers,
        body,
        state.engine.config().max_body_bytes,
    ) {
        Ok(classified) => classified,
        Err(err) => {
            warn!(
                event = "request_rejected",
                trace_id = %trace_id,
                deployment = %deployment,
                path = %operation,
                status = %err.status.as_u16(),
                code = %err.envelope.error.code
            );
            return error_response(err, &trace_id);
        }
    };

    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        deployment = %classified.deployment,
        op = %classified.operation.name(),
        api_version = ?classified.api_version,
        is_stream = classified.is_stream
    );

    let client_request_id = header_value(&headers, "x-ms-client-request-id");
    let result = state
        .engine
        .handle(classified, &trace_id, client_request_id.as_deref())
        .await;

    match result {
        Ok(response) => {
            info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                status = %response.status().as_u16(),
                elapsed_ms = started_at.elapsed().as_millis(),
                is_stream = response.is_stream()
            );
            proxy_response(response)
        }
        Err(err) => {
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                status = %err.status.as_u16(),
                code = %err.envelope.error.code,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            error_response(err, &trace_id)
        }
    }
}

fn proxy_response(response: ProxyResponse) -> Response {
    match response {
        ProxyResponse::Json {
            status,
            headers,
            body,
        } => {
            let mut resp = Response::new(Body::from(body));
            *resp.status_mut() = status;
            resp.headers_mut().extend(headers);
            resp
        }
        ProxyResponse::Stream {
            status,
            headers,
            frames,
        } => {
            let stream = ReceiverStream::new(frames).map(Ok::<_, Infallible>);
            let mut resp = Response::new(Body::from_stream(stream));
            *resp.status_mut() = status;
            resp.headers_mut().extend(headers);
            resp
        }
    }
}

fn error_response(err: ProxyError, trace_id: &str) -> Response {
    let mut resp = Response::new(Body::from(err.body_bytes()));
    *resp.status_mut() = err.status;
    resp.headers_mut().extend(err.headers);
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(trace_id) {
        resp.headers_mut().insert("apim-request-id", value);
    }
    resp
}

async fn health() -> Response {
    let mut resp = Response::new(Body::from(health_body().to_string()));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

async fn unknown_route(uri: Uri) -> Response {
    let mut resp = Response::new(Body::from(unknown_route_body(uri.path()).to_string()));
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn health_body() -> serde_json::Value {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    serde_json::json!({ "status": "healthy", "timestamp": timestamp })
}

fn unknown_route_body(path: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": "NotFound",
            "message": format!("no route for {path}"),
            "param": null,
            "type": null,
        },
        "supported_endpoints": SUPPORTED_ENDPOINTS,
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_body_is_well_formed() {
        let body = health_body();
        assert_eq!(body["status"], "healthy");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(timestamp, &Rfc3339).is_ok());
    }

    #[test]
    fn unknown_route_lists_supported_endpoints() {
        let body = unknown_route_body("/v1/nope");
        assert_eq!(body["error"]["code"], "NotFound");
        assert!(body["error"]["message"].as_str().unwrap().contains("/v1/nope"));
        assert_eq!(
            body["supported_endpoints"].as_array().unwrap().len(),
            SUPPORTED_ENDPOINTS.len()
        );
    }
}
