//! HTTP routing backend.
//!
//! Talks to the route-planning backend over JSON:
//!
//! | call        | request                          | success body              |
//! |-------------|----------------------------------|---------------------------|
//! | geocoding   | `POST {base}/geocoding {address}`| `{lon, lat}`              |
//! | routing     | `POST {base}/rota` [`RouteRequest`] | GeoJSON `FeatureCollection` |
//!
//! Requests carry `Authorization: Bearer <token>` when a token is configured.
//! Failures carry `{"erro": "...", "detalhe": ...}`; the pair becomes the
//! provider detail of [`BackendError::Http`]. 401/403 map to
//! [`BackendError::SessionExpired`], 404 to [`BackendError::NotFound`].

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::coord::LonLat;

use super::backend::RoutingBackend;
use super::error::BackendError;
use super::request::RouteRequest;
use super::response::RouteResponse;

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(12);

const GEOCODING_PATH: &str = "geocoding";
const ROUTE_PATH: &str = "rota";

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`RoutingBackend`] over HTTP.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let url = self.url(path);
        trace!(url = %url, "HTTP POST request starting");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(
                url = %url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Network(format!("failed to read response body: {}", e))
            }
        })?;

        debug!(url = %url, status, len = bytes.len(), "HTTP response received");

        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl RoutingBackend for HttpBackend {
    async fn geocode(&self, address: &str) -> Result<LonLat, BackendError> {
        let body = self
            .post_json(GEOCODING_PATH, &json!({ "address": address }))
            .await
            .map_err(|e| match e {
                BackendError::NotFound(_) => BackendError::NotFound(address.to_string()),
                other => other,
            })?;

        let lon = body.get("lon").and_then(Value::as_f64);
        let lat = body.get("lat").and_then(Value::as_f64);
        match (lon, lat) {
            (Some(lon), Some(lat)) => {
                LonLat::new(lon, lat).map_err(|e| BackendError::Decode(e.to_string()))
            }
            _ => Err(BackendError::Decode(
                "geocoding response has no lon/lat".to_string(),
            )),
        }
    }

    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        let body = self.post_json(ROUTE_PATH, request).await?;
        RouteResponse::from_value(body)
    }
}

/// Map a non-success response to a [`BackendError`].
pub fn classify_failure(status: u16, body: &[u8]) -> BackendError {
    let detail = provider_detail(body);
    match status {
        401 | 403 => BackendError::SessionExpired { status },
        404 => BackendError::NotFound(detail.unwrap_or_else(|| "not found".to_string())),
        _ => BackendError::Http { status, detail },
    }
}

/// Extract a human-readable detail from an error body.
///
/// Understands `{"erro", "detalhe"}` and the common `error`/`message`
/// fields; `detalhe` may be a string or a nested object.
fn provider_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let headline = ["erro", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty());

    let nested = value.get("detalhe").and_then(|detail| match detail {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(object) => object
            .get("message")
            .or_else(|| object.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(detail.to_string())),
        _ => None,
    });

    match (headline, nested) {
        (Some(h), Some(n)) => Some(format!("{}: {}", h, n)),
        (Some(h), None) => Some(h.to_string()),
        (None, Some(n)) => Some(n),
        (None, None) => None,
    }
}
