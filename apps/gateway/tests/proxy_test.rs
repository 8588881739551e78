//! Gateway forwarding tests
//!
//! Each test starts a real axum upstream on an ephemeral port and drives the
//! gateway router with `oneshot`:
//! - method, path, query and body forwarding
//! - forwarded-header rewriting
//! - relayed upstream statuses and body re-encoding
//! - 503 / 504 / 502 failure mapping

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use gateway::{ProxyClient, UpstreamConfig, routes};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Reports what the upstream received
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value.to_str().unwrap_or_default())))
        .collect();

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Fixed answers for a few paths, echo for everything else
async fn upstream_handler(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    match uri.path() {
        "/api/missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Not found", "message": "Product not found"})),
        )
            .into_response(),
        "/api/text" => "plain text".into_response(),
        "/api/empty" => StatusCode::NO_CONTENT.into_response(),
        "/api/slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"late": true})).into_response()
        }
        "/api/big" => "x".repeat(4096).into_response(),
        _ => echo(method, uri, headers, body).await.into_response(),
    }
}

fn upstream() -> Router {
    Router::new()
        .route("/api", any(upstream_handler))
        .route("/api/{*rest}", any(upstream_handler))
}

async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream()).await.unwrap();
    });
    addr
}

fn gateway(config: UpstreamConfig) -> Router {
    routes::router(ProxyClient::new(&config).unwrap()).unwrap()
}

async fn gateway_to_upstream() -> Router {
    let addr = spawn_upstream().await;
    gateway(UpstreamConfig::new(format!("http://{}", addr)))
}

/// An address nothing listens on
async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_is_answered_locally() {
    let app = gateway(UpstreamConfig::new(format!("http://{}", closed_port().await)));

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await, json!({"ok": true}));
}

#[tokio::test]
async fn test_unknown_path_is_not_proxied() {
    let app = gateway(UpstreamConfig::new(format!("http://{}", closed_port().await)));

    let response = app.oneshot(get_request("/admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_forwards_method_path_and_query() {
    let app = gateway_to_upstream().await;

    let response = app
        .oneshot(get_request("/api/products?category=Home%20Garden&page=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = json_body(response.into_body()).await;
    assert_eq!(seen["method"], "GET");
    assert_eq!(seen["path"], "/api/products");
    assert_eq!(seen["query"], "category=Home+Garden&page=2");
    assert_eq!(seen["body"], "");
    assert!(seen["headers"].get("content-type").is_none());
}

#[tokio::test]
async fn test_forwards_bare_api_prefix() {
    let app = gateway_to_upstream().await;

    let response = app.oneshot(get_request("/api")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = json_body(response.into_body()).await;
    assert_eq!(seen["path"], "/api");
}

#[tokio::test]
async fn test_forwards_json_object_body() {
    let app = gateway_to_upstream().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .body(Body::from(r#"{"name":"Laptop","price":999.99}"#))
        .unwrap();

    let seen = json_body(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(seen["method"], "POST");
    assert_eq!(seen["headers"]["content-type"], "application/json");

    let forwarded: Value = serde_json::from_str(seen["body"].as_str().unwrap()).unwrap();
    assert_eq!(forwarded, json!({"name": "Laptop", "price": 999.99}));
}

#[tokio::test]
async fn test_empty_object_body_is_not_forwarded() {
    let app = gateway_to_upstream().await;

    let request = Request::builder()
        .method("PATCH")
        .uri("/api/products/abc")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let seen = json_body(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(seen["method"], "PATCH");
    assert_eq!(seen["body"], "");
    assert!(seen["headers"].get("content-type").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_rejected_without_forwarding() {
    // Nothing listens upstream, so forwarding would produce a 503
    let app = gateway(UpstreamConfig::new(format!("http://{}", closed_port().await)));

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Invalid input");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_non_json_body_is_dropped_not_rejected() {
    let app = gateway_to_upstream().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header("content-type", "text/plain")
        .body(Body::from("{\"name\": not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = json_body(response.into_body()).await;
    assert_eq!(seen["method"], "POST");
    assert_eq!(seen["body"], "");
    assert!(seen["headers"].get("content-type").is_none());
}

#[tokio::test]
async fn test_forwarded_headers_are_rewritten() {
    let app = gateway_to_upstream().await;

    let mut request = Request::builder()
        .uri("/api/products")
        .header("host", "shop.example")
        .header("x-forwarded-for", "6.6.6.6")
        .header("accept-encoding", "gzip")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5555))));

    let seen = json_body(app.oneshot(request).await.unwrap().into_body()).await;
    let headers = &seen["headers"];
    assert_eq!(headers["x-forwarded-for"], "10.1.2.3");
    assert_eq!(headers["x-forwarded-proto"], "http");
    assert_eq!(headers["x-forwarded-host"], "shop.example");
    assert_eq!(headers["x-request-id"], "req-42");
    assert!(headers.get("accept-encoding").is_none());
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let app = gateway_to_upstream().await;

    let response = app.oneshot(get_request("/api/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response.into_body()).await,
        json!({"error": "Not found", "message": "Product not found"})
    );
}

#[tokio::test]
async fn test_non_json_upstream_body_is_wrapped() {
    let app = gateway_to_upstream().await;

    let response = app.oneshot(get_request("/api/text")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(json_body(response.into_body()).await, json!("plain text"));
}

#[tokio::test]
async fn test_no_content_is_relayed_without_body() {
    let app = gateway_to_upstream().await;

    let response = app.oneshot(get_request("/api/empty")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_connection_refused_maps_to_503() {
    let app = gateway(UpstreamConfig::new(format!("http://{}", closed_port().await)));

    let response = app.oneshot(get_request("/api/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Backend service unavailable");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_timeout_maps_to_504() {
    let addr = spawn_upstream().await;
    let app = gateway(
        UpstreamConfig::new(format!("http://{}", addr)).with_timeout(Duration::from_millis(200)),
    );

    let response = app.oneshot(get_request("/api/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Gateway timeout");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_oversized_upstream_body_maps_to_502() {
    let addr = spawn_upstream().await;
    let app = gateway(UpstreamConfig::new(format!("http://{}", addr)).with_max_body_bytes(1024));

    let response = app.oneshot(get_request("/api/big")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        json_body(response.into_body()).await,
        json!({"error": "Bad gateway"})
    );
}

#[tokio::test]
async fn test_oversized_request_body_is_rejected() {
    let app = gateway(
        UpstreamConfig::new(format!("http://{}", closed_port().await)).with_max_body_bytes(64),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .body(Body::from(format!("{{\"name\":\"{}\"}}", "x".repeat(256))))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
