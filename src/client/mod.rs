//! Live introspection client
//!
//! Typed boundary to a running editor session that answers Blueprint and
//! asset queries. The service is optional: when no host is configured the
//! analyzer runs in C++-only mode and never constructs a client.
//!
//! @module client

pub mod http;
pub mod types;

pub use http::HttpService;
pub use types::{extract_refs, AssetRef, ServiceOperation, ServiceRequest};

use serde_json::Value;
use std::future::Future;
use tracing::debug;

use crate::core::domain::Domain;
use crate::core::error::{Error, Result};

/// Payload keys that carry outgoing references
const OUTGOING_KEYS: &[&str] = &["dependencies", "references"];
const INCOMING_KEYS: &[&str] = &["referencers"];
const SEARCH_KEYS: &[&str] = &["matches", "results", "assets", "blueprints"];

/// Transport seam: one request in, one JSON payload out
///
/// Failures must be `Error::ExternalService` attributed to the request's
/// domain.
pub trait LiveService: Send + Sync {
    fn fetch(&self, request: &ServiceRequest) -> impl Future<Output = Result<Value>> + Send;
}

// =============================================================================
// TYPED CLIENT
// =============================================================================

pub struct IntrospectionClient<S> {
    service: S,
}

impl<S: LiveService> IntrospectionClient<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn call(&self, request: ServiceRequest) -> Result<Value> {
        let result = self.service.fetch(&request).await;
        if let Err(e) = &result {
            debug!(route = request.operation.route(), error = %e, "Live service call failed");
        }
        result
    }

    pub async fn blueprint_search(&self, pattern: &str, class: Option<&str>) -> Result<Vec<AssetRef>> {
        let request = ServiceRequest::new(ServiceOperation::BlueprintSearch)
            .param("pattern", pattern)
            .optional("class", class);
        let payload = self.call(request).await?;
        Ok(extract_refs(&payload, SEARCH_KEYS))
    }

    pub async fn asset_search(&self, pattern: &str, asset_type: Option<&str>) -> Result<Vec<AssetRef>> {
        let request = ServiceRequest::new(ServiceOperation::AssetSearch)
            .param("pattern", pattern)
            .optional("type", asset_type);
        let payload = self.call(request).await?;
        Ok(extract_refs(&payload, SEARCH_KEYS))
    }

    /// Search either live domain
    pub async fn search(&self, domain: Domain, pattern: &str, filter: Option<&str>) -> Result<Vec<AssetRef>> {
        match domain {
            Domain::Blueprint => self.blueprint_search(pattern, filter).await,
            Domain::Asset => self.asset_search(pattern, filter).await,
            Domain::Cpp => Err(not_live(domain)),
        }
    }

    pub async fn blueprint_hierarchy(&self, bp_path: &str) -> Result<Value> {
        self.call(ServiceRequest::for_path(ServiceOperation::BlueprintHierarchy, bp_path))
            .await
    }

    pub async fn blueprint_graph(&self, bp_path: &str, graph_name: Option<&str>) -> Result<Value> {
        let request = ServiceRequest::for_path(ServiceOperation::BlueprintGraph, bp_path)
            .optional("graph_name", graph_name);
        self.call(request).await
    }

    pub async fn blueprint_details(&self, bp_path: &str) -> Result<Value> {
        self.call(ServiceRequest::for_path(ServiceOperation::BlueprintDetails, bp_path))
            .await
    }

    pub async fn asset_metadata(&self, asset_path: &str) -> Result<Value> {
        self.call(ServiceRequest::for_path(ServiceOperation::AssetMetadata, asset_path))
            .await
    }

    /// What `path` depends on
    pub async fn outgoing(&self, domain: Domain, path: &str) -> Result<Vec<AssetRef>> {
        let operation = match domain {
            Domain::Blueprint => ServiceOperation::BlueprintDependencies,
            Domain::Asset => ServiceOperation::AssetReferences,
            Domain::Cpp => return Err(not_live(domain)),
        };
        let payload = self.call(ServiceRequest::for_path(operation, path)).await?;
        Ok(extract_refs(&payload, OUTGOING_KEYS))
    }

    /// What depends on `path`
    pub async fn incoming(&self, domain: Domain, path: &str) -> Result<Vec<AssetRef>> {
        let operation = match domain {
            Domain::Blueprint => ServiceOperation::BlueprintReferencers,
            Domain::Asset => ServiceOperation::AssetReferencers,
            Domain::Cpp => return Err(not_live(domain)),
        };
        let payload = self.call(ServiceRequest::for_path(operation, path)).await?;
        Ok(extract_refs(&payload, INCOMING_KEYS))
    }

    /// Blueprint details or asset metadata
    pub async fn details(&self, domain: Domain, path: &str) -> Result<Value> {
        match domain {
            Domain::Blueprint => self.blueprint_details(path).await,
            Domain::Asset => self.asset_metadata(path).await,
            Domain::Cpp => Err(not_live(domain)),
        }
    }
}

fn not_live(domain: Domain) -> Error {
    Error::InvalidQuery {
        message: format!("{} is not served by the live service", domain),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticService;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_outgoing_routes_by_domain() {
        let service = StaticService::new()
            .respond(
                ServiceOperation::BlueprintDependencies,
                "/Game/BP_Hero",
                json!({"dependencies": ["/Game/M_Skin"]}),
            )
            .respond(
                ServiceOperation::AssetReferences,
                "/Game/M_Skin",
                json!({"references": ["/Game/T_Skin"]}),
            );
        let client = IntrospectionClient::new(service);

        let bp = client.outgoing(Domain::Blueprint, "/Game/BP_Hero").await.unwrap();
        assert_eq!(bp[0].name, "M_Skin");
        let asset = client.outgoing(Domain::Asset, "/Game/M_Skin").await.unwrap();
        assert_eq!(asset[0].name, "T_Skin");

        let calls = client.service().calls();
        assert_eq!(calls[0].get("bp_path"), Some("/Game/BP_Hero"));
        assert_eq!(calls[1].get("asset_path"), Some("/Game/M_Skin"));
    }

    #[tokio::test]
    async fn test_cpp_is_rejected() {
        let client = IntrospectionClient::new(StaticService::new());
        assert!(matches!(
            client.incoming(Domain::Cpp, "UFoo").await,
            Err(Error::InvalidQuery { .. })
        ));
        assert!(client.service().calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_with_class_filter() {
        let service = StaticService::new().respond(
            ServiceOperation::BlueprintSearch,
            "UHealthComponent",
            json!({"matches": [{"path": "/Game/BP_Medic", "parent_class": "/Script/Game.HealthComponent"}]}),
        );
        let client = IntrospectionClient::new(service);
        let found = client.blueprint_search("*", Some("UHealthComponent")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].parent_class_name(), Some("HealthComponent"));
    }

    #[tokio::test]
    async fn test_failure_is_attributed() {
        let client = IntrospectionClient::new(StaticService::new().fail(ServiceOperation::AssetMetadata));
        let err = client.details(Domain::Asset, "/Game/X").await.unwrap_err();
        assert_eq!(err.domain(), Some(Domain::Asset));
    }
}
