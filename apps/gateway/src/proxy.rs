//! Request forwarding to the products backend.
//!
//! Failure classes map onto HTTP statuses in this order:
//!
//! | upstream failure             | status |
//! |------------------------------|--------|
//! | connection refused           | 503    |
//! | timeout                      | 504    |
//! | any other transport failure  | 502    |
//!
//! Any status the upstream actually answers with, 4xx and 5xx included, is
//! relayed as-is. Upstream bodies are fully buffered and re-encoded as JSON
//! before the first byte goes to the client, so a 502 never follows a
//! partial response.

use axum::{
    Json,
    extract::{ConnectInfo, FromRequest, Request, State},
    http::{
        Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
        header::{self, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use axum_helpers::{AppError, Payload};
use reqwest::Url;
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use tracing::instrument;

use crate::config::UpstreamConfig;
use crate::logging::UpstreamUrl;

/// Request headers that are never copied to the upstream request
const STRIPPED_HEADERS: [&str; 12] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
    "content-type",
    "accept-encoding",
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream timed out: {0}")]
    Timeout(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

impl ProxyError {
    /// Classify a transport error; connection failures win over timeouts.
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ProxyError::Unavailable(err.to_string())
        } else if err.is_timeout() {
            ProxyError::Timeout(err.to_string())
        } else {
            ProxyError::BadGateway(err.to_string())
        }
    }
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Unavailable(detail) => AppError::ServiceUnavailable(detail),
            ProxyError::Timeout(detail) => AppError::GatewayTimeout(detail),
            ProxyError::BadGateway(detail) | ProxyError::Config(detail) => {
                AppError::BadGateway(detail)
            }
        }
    }
}

/// A request ready to be sent upstream
#[derive(Debug)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<(HeaderValue, Vec<u8>)>,
}

/// Buffered upstream answer
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// `None` for statuses that must not carry a body
    pub body: Option<Value>,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// HTTP client bound to one upstream base URL
#[derive(Clone, Debug)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: Url,
    max_body_bytes: usize,
}

impl ProxyClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let base_url = Url::parse(&config.backend_url)
            .map_err(|e| ProxyError::Config(format!("BACKEND_URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Upstream URL for an inbound URI.
    ///
    /// The inbound path is appended to the base path and the query string is
    /// decoded and re-encoded pair by pair rather than copied.
    pub fn target_url(&self, uri: &Uri) -> Result<Url, ProxyError> {
        let mut url = self.base_url.clone();
        let path = format!("{}{}", self.base_url.path().trim_end_matches('/'), uri.path());
        url.set_path(&path);
        url.set_query(None);

        if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
            let inbound = Url::parse(&format!("http://inbound/?{}", query))
                .map_err(|e| ProxyError::BadGateway(format!("Unparsable query: {}", e)))?;
            let pairs: Vec<_> = inbound.query_pairs().into_owned().collect();
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        Ok(url)
    }

    /// Send a request and buffer the whole response.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: ForwardRequest) -> Result<UpstreamResponse, ProxyError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some((content_type, body)) = request.body {
            builder = builder.header(CONTENT_TYPE, content_type).body(body);
        }

        let mut response = builder.send().await.map_err(ProxyError::from_transport)?;
        let status = response.status();

        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(ProxyError::from_transport)? {
            if buffer.len() + chunk.len() > self.max_body_bytes {
                return Err(ProxyError::BadGateway(format!(
                    "Upstream response exceeded {} bytes",
                    self.max_body_bytes
                )));
            }
            buffer.extend_from_slice(&chunk);
        }

        let body = if matches!(status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED) {
            None
        } else {
            Some(reencode(&buffer))
        };

        Ok(UpstreamResponse { status, body })
    }
}

/// Parse an upstream body as JSON, or wrap it as a JSON string.
pub fn reencode(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Copy inbound headers minus hop-by-hop and forwarding headers, then set the
/// gateway's own `x-forwarded-*` values.
pub fn forward_headers(inbound: &HeaderMap, peer: Option<IpAddr>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 3);
    for (name, value) in inbound {
        let name_str = name.as_str();
        if STRIPPED_HEADERS.contains(&name_str) || name_str.starts_with("x-forwarded-") {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(value) = peer.and_then(|ip| HeaderValue::from_str(&ip.to_string()).ok()) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    if let Some(host) = inbound.get(header::HOST) {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }

    headers
}

/// Body to forward: only a non-empty JSON object, with the inbound
/// content type or `application/json`.
pub fn forward_body(
    inbound: &HeaderMap,
    body: &Value,
) -> Result<Option<(HeaderValue, Vec<u8>)>, ProxyError> {
    match body {
        Value::Object(map) if !map.is_empty() => {
            let content_type = inbound
                .get(CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ProxyError::BadGateway(format!("Failed to encode body: {}", e)))?;
            Ok(Some((content_type, bytes)))
        }
        _ => Ok(None),
    }
}

/// Whether a `Content-Type` names JSON (`application/json` or a `+json` type).
pub fn is_json_content_type(value: &HeaderValue) -> bool {
    let Ok(value) = value.to_str() else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Inbound body as JSON.
///
/// A body is parsed only when its content type is JSON or absent. Anything
/// else is treated as no body at all and is not forwarded.
pub struct InboundBody(pub Value);

impl<S> FromRequest<S> for InboundBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let parse = req
            .headers()
            .get(CONTENT_TYPE)
            .is_none_or(is_json_content_type);
        if !parse {
            return Ok(InboundBody(Value::Object(Default::default())));
        }

        let Payload(body) = Payload::<Value>::from_request(req, state).await?;
        Ok(InboundBody(body))
    }
}

/// Forward any request under `/api` to the backend.
pub async fn forward(
    State(proxy): State<ProxyClient>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    InboundBody(body): InboundBody,
) -> Response {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let url = match proxy.target_url(&uri) {
        Ok(url) => url,
        Err(err) => return AppError::from(err).into_response(),
    };
    let upstream_url = UpstreamUrl(url.to_string());

    let result = match forward_body(&headers, &body) {
        Ok(body) => {
            let request = ForwardRequest {
                method,
                url,
                headers: forward_headers(&headers, peer),
                body,
            };
            proxy.send(request).await
        }
        Err(err) => Err(err),
    };

    let mut response = match result {
        Ok(upstream) => upstream.into_response(),
        Err(err) => AppError::from(err).into_response(),
    };
    response.extensions_mut().insert(upstream_url);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> ProxyClient {
        ProxyClient::new(&UpstreamConfig::new(base)).unwrap()
    }

    #[test]
    fn test_target_url_keeps_path() {
        let proxy = client("http://backend:3000");
        let url = proxy.target_url(&Uri::from_static("/api/products/abc")).unwrap();
        assert_eq!(url.as_str(), "http://backend:3000/api/products/abc");
    }

    #[test]
    fn test_target_url_joins_base_path() {
        let proxy = client("http://backend:3000/v1/");
        let url = proxy.target_url(&Uri::from_static("/api/products")).unwrap();
        assert_eq!(url.as_str(), "http://backend:3000/v1/api/products");
    }

    #[test]
    fn test_target_url_reencodes_query() {
        let proxy = client("http://backend:3000");
        let url = proxy
            .target_url(&Uri::from_static("/api/products?category=Home%20Garden&page=2"))
            .unwrap();
        assert_eq!(url.query(), Some("category=Home+Garden&page=2"));

        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("category".to_string(), "Home Garden".to_string()));
    }

    #[test]
    fn test_target_url_without_query() {
        let proxy = client("http://backend:3000");
        let url = proxy.target_url(&Uri::from_static("/api/products?")).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_invalid_backend_url() {
        let err = ProxyClient::new(&UpstreamConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }

    #[test]
    fn test_forward_headers_strips_and_sets() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("shop.example"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        inbound.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        inbound.insert(X_FORWARDED_FOR, HeaderValue::from_static("6.6.6.6"));
        inbound.insert("x-forwarded-port", HeaderValue::from_static("443"));
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        let headers = forward_headers(&inbound, Some("10.0.0.7".parse().unwrap()));

        assert_eq!(headers.get(X_FORWARDED_FOR).unwrap(), "10.0.0.7");
        assert_eq!(headers.get(X_FORWARDED_PROTO).unwrap(), "http");
        assert_eq!(headers.get(X_FORWARDED_HOST).unwrap(), "shop.example");
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get(header::ACCEPT_ENCODING).is_none());
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert!(headers.get("x-forwarded-port").is_none());
    }

    #[test]
    fn test_forward_headers_without_peer_drops_client_value() {
        let mut inbound = HeaderMap::new();
        inbound.insert(X_FORWARDED_FOR, HeaderValue::from_static("6.6.6.6"));

        let headers = forward_headers(&inbound, None);
        assert!(headers.get(X_FORWARDED_FOR).is_none());
    }

    #[test]
    fn test_forward_body_only_non_empty_objects() {
        let headers = HeaderMap::new();

        assert!(forward_body(&headers, &json!({})).unwrap().is_none());
        assert!(forward_body(&headers, &json!([1, 2])).unwrap().is_none());
        assert!(forward_body(&headers, &json!("text")).unwrap().is_none());

        let (content_type, bytes) = forward_body(&headers, &json!({"name": "Laptop"}))
            .unwrap()
            .unwrap();
        assert_eq!(content_type, "application/json");
        assert_eq!(bytes, br#"{"name":"Laptop"}"#);
    }

    #[test]
    fn test_forward_body_keeps_inbound_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let (content_type, _) = forward_body(&headers, &json!({"a": 1})).unwrap().unwrap();
        assert_eq!(content_type, "application/json; charset=utf-8");
    }

    #[test]
    fn test_json_content_types() {
        for value in [
            "application/json",
            "application/json; charset=utf-8",
            "Application/JSON",
            "application/merge-patch+json",
        ] {
            assert!(is_json_content_type(&HeaderValue::from_static(value)), "{}", value);
        }
        for value in ["text/plain", "application/x-www-form-urlencoded", "multipart/form-data"] {
            assert!(!is_json_content_type(&HeaderValue::from_static(value)), "{}", value);
        }
    }

    #[test]
    fn test_reencode() {
        assert_eq!(reencode(br#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(reencode(b"<html>oops</html>"), json!("<html>oops</html>"));
        assert_eq!(reencode(b""), json!(""));
    }

    #[test]
    fn test_proxy_error_statuses() {
        let cases = [
            (ProxyError::Unavailable("refused".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ProxyError::Timeout("slow".into()), StatusCode::GATEWAY_TIMEOUT),
            (ProxyError::BadGateway("reset".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
