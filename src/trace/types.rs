//! Cross-domain trace data structures
//!
//! @module trace/types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::config::TraceConfig;
use crate::core::domain::Domain;
use crate::core::error::Error;

// =============================================================================
// NODES AND EDGES
// =============================================================================

/// An entity in one domain: a class name for `cpp`, an object path otherwise
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub domain: Domain,
    pub id: String,
}

impl ReferenceNode {
    pub fn new(domain: Domain, id: impl Into<String>) -> Self {
        Self {
            domain,
            id: id.into(),
        }
    }

    pub fn cpp(id: impl Into<String>) -> Self {
        Self::new(Domain::Cpp, id)
    }

    pub fn blueprint(id: impl Into<String>) -> Self {
        Self::new(Domain::Blueprint, id)
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::new(Domain::Asset, id)
    }
}

impl fmt::Display for ReferenceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// C++ class derives from C++ class
    Inherits,
    /// C++ code names another C++ class
    References,
    /// Blueprint is parented to a C++ class
    ParentClass,
    /// Blueprint or asset depends on another Blueprint or asset
    Dependency,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherits => "inherits",
            Self::References => "references",
            Self::ParentClass => "parent_class",
            Self::Dependency => "dependency",
        }
    }
}

/// `from` references `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from: ReferenceNode,
    pub to: ReferenceNode,
    pub kind: EdgeKind,
}

impl ReferenceEdge {
    pub fn new(from: ReferenceNode, to: ReferenceNode, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }

    pub fn crosses_domains(&self) -> bool {
        self.from.domain != self.to.domain
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Which edges the seed expands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionFilter {
    /// What the seed references
    Outgoing,
    /// What references the seed
    Incoming,
    #[default]
    Both,
}

impl DirectionFilter {
    pub fn outgoing(&self) -> bool {
        !matches!(self, Self::Incoming)
    }

    pub fn incoming(&self) -> bool {
        !matches!(self, Self::Outgoing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
            Self::Both => "both",
        }
    }
}

impl FromStr for DirectionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outgoing" | "out" | "dependencies" => Ok(Self::Outgoing),
            "incoming" | "in" | "referencers" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

impl fmt::Display for DirectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Applies to the seed only; deeper levels expand both ways
    pub direction: DirectionFilter,
    pub max_depth: usize,
    /// Budget of node expansions
    pub max_visits: usize,
    /// Concurrent expansions within one level
    pub fanout: usize,
    /// Keep only edges whose ends lie in different domains
    pub cross_domain_only: bool,
    /// Source scope for C++ lookups
    pub scope: Option<String>,
}

impl TraceOptions {
    pub fn from_config(config: &TraceConfig) -> Self {
        Self {
            direction: DirectionFilter::Both,
            max_depth: config.max_depth,
            max_visits: config.max_visits,
            fanout: config.fanout.max(1),
            cross_domain_only: false,
            scope: None,
        }
    }

    pub fn direction(mut self, direction: DirectionFilter) -> Self {
        self.direction = direction;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_visits(mut self, max_visits: usize) -> Self {
        self.max_visits = max_visits;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self::from_config(&TraceConfig::default())
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// A failed lookup during a trace, attributed to one domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TraceError {
    pub domain: Domain,
    pub message: String,
}

impl TraceError {
    pub fn from_error(fallback: Domain, error: &Error) -> Self {
        Self {
            domain: error.domain().unwrap_or(fallback),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceResult {
    pub seed: ReferenceNode,
    /// Discovered nodes in BFS order, seed first
    pub nodes: Vec<ReferenceNode>,
    pub edges: Vec<ReferenceEdge>,
    /// Distance of the farthest discovered node
    pub depth_reached: usize,
    pub truncated_by_depth: bool,
    pub truncated_by_budget: bool,
    pub errors: Vec<TraceError>,
}

impl TraceResult {
    pub fn is_complete(&self) -> bool {
        !self.truncated_by_depth && !self.truncated_by_budget
    }

    pub fn nodes_in(&self, domain: Domain) -> impl Iterator<Item = &ReferenceNode> {
        self.nodes.iter().filter(move |n| n.domain == domain)
    }
}

/// Where a C++ class is used from other domains
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub class_name: String,
    pub usages: Vec<ReferenceNode>,
    pub errors: Vec<TraceError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("IN".parse::<DirectionFilter>().unwrap(), DirectionFilter::Incoming);
        assert_eq!("both".parse::<DirectionFilter>().unwrap(), DirectionFilter::Both);
        assert!("sideways".parse::<DirectionFilter>().is_err());
        assert!(DirectionFilter::Both.outgoing() && DirectionFilter::Both.incoming());
        assert!(!DirectionFilter::Outgoing.incoming());
    }

    #[test]
    fn test_options_from_config() {
        let config = TraceConfig {
            fanout: 0,
            ..TraceConfig::default()
        };
        let options = TraceOptions::from_config(&config);
        assert_eq!(options.fanout, 1);
        assert_eq!(options.max_depth, 3);
        assert_eq!(options.max_visits, 200);
    }

    #[test]
    fn test_trace_error_attribution() {
        let error = Error::external(Domain::Asset, "references", "refused");
        assert_eq!(TraceError::from_error(Domain::Blueprint, &error).domain, Domain::Asset);
        let error = Error::InvalidQuery { message: "x".into() };
        assert_eq!(TraceError::from_error(Domain::Cpp, &error).domain, Domain::Cpp);
    }
}
