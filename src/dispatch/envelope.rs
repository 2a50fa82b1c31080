//! Unified response types
//!
//! @module dispatch/envelope

use serde::Serialize;
use serde_json::Value;

use crate::client::AssetRef;
use crate::core::domain::Domain;
use crate::core::error::Error;
use crate::query::{ClassDetails, ClassHierarchy, Lookup, Occurrence, SearchRequest, SearchResult};
use crate::scope::SearchScope;
use crate::trace::DirectionFilter;

/// A failure confined to one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainError {
    pub domain: Domain,
    pub error: String,
}

impl DomainError {
    pub fn new(domain: Domain, error: &Error) -> Self {
        Self {
            domain: error.domain().unwrap_or(domain),
            error: error.to_string(),
        }
    }
}

/// Result of one domain inside a unified call
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum DomainOutcome<T> {
    Found(T),
    NotFound { name: String },
    Failed(DomainError),
}

impl<T> DomainOutcome<T> {
    pub fn from_result(domain: Domain, result: crate::core::error::Result<T>) -> Self {
        match result {
            Ok(value) => DomainOutcome::Found(value),
            Err(e) => DomainOutcome::Failed(DomainError::new(domain, &e)),
        }
    }

    /// Search and list results: an empty success carries the not-found marker
    pub fn from_listing(
        domain: Domain,
        name: &str,
        result: crate::core::error::Result<T>,
        is_empty: impl FnOnce(&T) -> bool,
    ) -> Self {
        match result {
            Ok(value) if is_empty(&value) => DomainOutcome::NotFound {
                name: name.to_string(),
            },
            other => DomainOutcome::from_result(domain, other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainOutcome::NotFound { .. })
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            DomainOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DomainError> {
        match self {
            DomainOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DomainOutcome<U> {
        match self {
            DomainOutcome::Found(value) => DomainOutcome::Found(f(value)),
            DomainOutcome::NotFound { name } => DomainOutcome::NotFound { name },
            DomainOutcome::Failed(error) => DomainOutcome::Failed(error),
        }
    }
}

impl<T> From<Lookup<T>> for DomainOutcome<T> {
    fn from(lookup: Lookup<T>) -> Self {
        match lookup {
            Lookup::Found(value) => DomainOutcome::Found(value),
            Lookup::NotFound { name } => DomainOutcome::NotFound { name },
        }
    }
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Debug, Clone)]
pub struct UnifiedRequest {
    /// Query text, C++ mode, scope and per-domain limit
    pub search: SearchRequest,
    pub domains: Vec<Domain>,
    /// Asset class filter for the asset domain
    pub asset_type: Option<String>,
    /// Parent class filter for the blueprint domain
    pub class_filter: Option<String>,
}

impl UnifiedRequest {
    pub fn new(search: SearchRequest) -> Self {
        Self {
            search,
            domains: Domain::ALL.to_vec(),
            asset_type: None,
            class_filter: None,
        }
    }

    pub fn domains(mut self, domains: Vec<Domain>) -> Self {
        self.domains = domains;
        self
    }

    pub fn asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn class_filter(mut self, class_filter: impl Into<String>) -> Self {
        self.class_filter = Some(class_filter.into());
        self
    }
}

/// Blueprint or asset matches after scope filtering
#[derive(Debug, Clone, Serialize)]
pub struct LiveMatches {
    pub matches: Vec<AssetRef>,
    pub count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnifiedResponse {
    pub query: String,
    pub scope: SearchScope,
    pub domains_searched: Vec<Domain>,
    /// False when any searched domain failed
    pub ok: bool,
    /// Sum over successful domains
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpp: Option<DomainOutcome<SearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blueprint: Option<DomainOutcome<LiveMatches>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<DomainOutcome<LiveMatches>>,
    pub errors: Vec<DomainError>,
    pub warnings: Vec<String>,
    pub tips: Vec<String>,
}

// =============================================================================
// SINGLE ENTITY
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HierarchyReport {
    Cpp(ClassHierarchy),
    Live(Value),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DetailsReport {
    Cpp(ClassDetails),
    Live(Value),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReferenceList {
    Source(Vec<Occurrence>),
    Live(Vec<AssetRef>),
}

impl ReferenceList {
    pub fn len(&self) -> usize {
        match self {
            ReferenceList::Source(items) => items.len(),
            ReferenceList::Live(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceReport {
    pub path: String,
    pub domain: Domain,
    pub direction: DirectionFilter,
    /// Not reported for C++, which only answers incoming references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<ReferenceList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<ReferenceList>,
}

impl ReferenceReport {
    /// No reference in any requested direction
    pub fn is_empty(&self) -> bool {
        [&self.outgoing, &self.incoming]
            .into_iter()
            .flatten()
            .all(ReferenceList::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_serialization() {
        let found: DomainOutcome<Value> = DomainOutcome::Found(json!([1, 2]));
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            json!({"status": "found", "result": [1, 2]})
        );

        let failed: DomainOutcome<Value> = DomainOutcome::from_result(
            Domain::Blueprint,
            Err(Error::external(Domain::Blueprint, "search", "refused")),
        );
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["result"]["domain"], "blueprint");
        assert!(failed.error().is_some());
    }

    #[test]
    fn test_lookup_conversion() {
        let outcome: DomainOutcome<u32> = Lookup::<u32>::not_found("UMissing").into();
        assert!(matches!(outcome, DomainOutcome::NotFound { ref name } if name == "UMissing"));
        assert_eq!(outcome.map(|v| v + 1).found(), None);
    }
}
