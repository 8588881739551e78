//! Per-request proxy log line.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Resolved upstream URL, attached to the response by the forwarding handler
#[derive(Clone, Debug)]
pub struct UpstreamUrl(pub String);

/// Log method, original path, upstream URL, status and latency for every
/// request that reaches the proxy routes.
///
/// Requests rejected before forwarding (e.g. malformed JSON) log `upstream_url = "-"`.
pub async fn log_proxied_request(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let upstream_url = response
        .extensions()
        .get::<UpstreamUrl>()
        .map(|url| url.0.as_str())
        .unwrap_or("-");

    if response.status().is_server_error() {
        tracing::warn!(%method, %path, upstream_url, status, latency_ms, "Proxy request failed");
    } else {
        tracing::info!(%method, %path, upstream_url, status, latency_ms, "Proxy request");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_response_passes_through() {
        let app = Router::new()
            .route(
                "/api/items",
                get(|| async {
                    let mut response = Response::new(Body::from("ok"));
                    response
                        .extensions_mut()
                        .insert(UpstreamUrl("http://backend/api/items".into()));
                    response
                }),
            )
            .layer(middleware::from_fn(log_proxied_request));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/items?page=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.extensions().get::<UpstreamUrl>().unwrap().0,
            "http://backend/api/items"
        );
    }
}
