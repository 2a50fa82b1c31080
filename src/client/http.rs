//! HTTP transport for the live introspection service
//!
//! Every operation is a GET on `{base}/{domain}/{operation}` with flat query
//! parameters and a JSON body in reply.
//!
//! @module client/http

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::types::ServiceRequest;
use super::LiveService;
use crate::core::config::ServiceConfig;
use crate::core::error::{Error, Result};

// =============================================================================
// CONSTANTS
// =============================================================================

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

// =============================================================================
// HTTP SERVICE
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    base_url: Url,
}

impl HttpService {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_else(|_| Client::new());

        // `Url::join` replaces the last segment unless the path ends in '/'
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self { client, base_url }
    }

    /// `None` when no host is configured
    pub fn from_config(config: &ServiceConfig) -> Result<Option<Self>> {
        Ok(config
            .base_url()?
            .map(|url| Self::new(url, config.timeout())))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check if the service answers its health route
    pub async fn is_available(&self) -> bool {
        let url = match self.base_url.join("health") {
            Ok(url) => url,
            Err(_) => return false,
        };
        self.client
            .get(url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn endpoint(&self, request: &ServiceRequest) -> Result<Url> {
        self.base_url
            .join(request.operation.route())
            .map_err(|e| self.call_error(request, e))
    }

    fn call_error(&self, request: &ServiceRequest, cause: impl ToString) -> Error {
        Error::external(request.domain(), request.operation.name(), cause)
    }

    fn connection_error(&self, request: &ServiceRequest, e: reqwest::Error) -> Error {
        let cause = if e.is_connect() {
            format!("cannot connect to {}", self.base_url)
        } else if e.is_timeout() {
            "request timed out".to_string()
        } else {
            format!("request failed: {}", e)
        };
        self.call_error(request, cause)
    }
}

impl LiveService for HttpService {
    async fn fetch(&self, request: &ServiceRequest) -> Result<Value> {
        let url = self.endpoint(request)?;
        debug!(route = request.operation.route(), params = ?request.params, "Live service call");

        let res = self
            .client
            .get(url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| self.connection_error(request, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(self.call_error(request, format!("HTTP {} - {}", status, text.trim())));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| self.call_error(request, format!("invalid response body: {}", e)))?;

        if payload.get("ok").and_then(Value::as_bool) == Some(false) {
            let cause = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("service reported failure");
            return Err(self.call_error(request, cause));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::ServiceOperation;
    use crate::core::domain::Domain;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    async fn spawn(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn service(addr: SocketAddr, timeout: Duration) -> HttpService {
        let url = Url::parse(&format!("http://{}", addr)).unwrap();
        HttpService::new(url, timeout)
    }

    #[tokio::test]
    async fn test_fetch_passes_query_params() {
        let app = Router::new()
            .route(
                "/blueprint/dependencies",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({"ok": true, "dependencies": [q.get("bp_path").cloned().unwrap_or_default()]}))
                }),
            )
            .route("/health", get(|| async { "ok" }));
        let addr = spawn(app).await;
        let http = service(addr, Duration::from_secs(5));

        assert!(http.is_available().await);
        let request = ServiceRequest::for_path(ServiceOperation::BlueprintDependencies, "/Game/BP_Hero");
        let payload = http.fetch(&request).await.unwrap();
        assert_eq!(payload["dependencies"][0], "/Game/BP_Hero");
    }

    #[tokio::test]
    async fn test_non_success_status_is_external_error() {
        let app = Router::new().route(
            "/asset/search",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "registry busy") }),
        );
        let addr = spawn(app).await;
        let http = service(addr, Duration::from_secs(5));

        let request = ServiceRequest::new(ServiceOperation::AssetSearch).param("pattern", "*");
        match http.fetch(&request).await {
            Err(Error::ExternalService { domain, operation, cause }) => {
                assert_eq!(domain, Domain::Asset);
                assert_eq!(operation, "search");
                assert!(cause.contains("500"));
                assert!(cause.contains("registry busy"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ok_false_body_is_failure() {
        let app = Router::new().route(
            "/blueprint/details",
            get(|| async { Json(json!({"ok": false, "error": "Blueprint not found"})) }),
        );
        let addr = spawn(app).await;
        let http = service(addr, Duration::from_secs(5));

        let request = ServiceRequest::for_path(ServiceOperation::BlueprintDetails, "/Game/Nope");
        let err = http.fetch(&request).await.unwrap_err();
        assert_eq!(err.domain(), Some(Domain::Blueprint));
        assert!(err.to_string().contains("Blueprint not found"));
    }

    #[tokio::test]
    async fn test_timeout_is_external_error() {
        let app = Router::new().route(
            "/asset/metadata",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"ok": true}))
            }),
        );
        let addr = spawn(app).await;
        let http = service(addr, Duration::from_millis(200));

        let request = ServiceRequest::for_path(ServiceOperation::AssetMetadata, "/Game/M");
        let err = http.fetch(&request).await.unwrap_err();
        assert!(matches!(err, Error::ExternalService { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let http = service(addr, Duration::from_secs(2));
        assert!(!http.is_available().await);
        let request = ServiceRequest::new(ServiceOperation::BlueprintSearch).param("pattern", "*");
        let err = http.fetch(&request).await.unwrap_err();
        assert_eq!(err.domain(), Some(Domain::Blueprint));
    }

    #[test]
    fn test_from_config() {
        let config = ServiceConfig::default();
        assert!(HttpService::from_config(&config).unwrap().is_none());

        let config = ServiceConfig {
            host: Some("http://10.0.0.2:9000/api".to_string()),
            ..ServiceConfig::default()
        };
        let http = HttpService::from_config(&config).unwrap().unwrap();
        assert_eq!(http.base_url().as_str(), "http://10.0.0.2:9000/api/");
        let request = ServiceRequest::new(ServiceOperation::AssetSearch);
        assert_eq!(
            http.endpoint(&request).unwrap().as_str(),
            "http://10.0.0.2:9000/api/asset/search"
        );
    }
}
