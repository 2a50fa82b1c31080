//! Cross-domain BFS traversal
//!
//! Expands one level at a time. Nodes of a level are expanded concurrently
//! (bounded by `fanout`) and merged back in discovery order, so two runs
//! over the same data produce the same result.
//!
//! @module trace/traverse

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::types::{
    DirectionFilter, EdgeKind, ReferenceEdge, ReferenceNode, TraceError, TraceOptions, TraceResult,
    UsageReport,
};
use crate::client::{AssetRef, IntrospectionClient, LiveService};
use crate::core::domain::Domain;
use crate::core::error::{Error, Result};
use crate::index::symbols::strip_type_prefix;
use crate::index::IndexView;
use crate::query::{search, QueryEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Queued,
    Visiting,
    Visited,
}

/// Edges found around one node, paired with the neighbour they lead to
#[derive(Default)]
struct Expansion {
    edges: Vec<(ReferenceEdge, ReferenceNode)>,
    errors: Vec<TraceError>,
}

impl Expansion {
    fn outgoing(&mut self, node: &ReferenceNode, to: ReferenceNode, kind: EdgeKind) {
        let edge = ReferenceEdge::new(node.clone(), to.clone(), kind);
        self.edges.push((edge, to));
    }

    fn incoming(&mut self, node: &ReferenceNode, from: ReferenceNode, kind: EdgeKind) {
        let edge = ReferenceEdge::new(from.clone(), node.clone(), kind);
        self.edges.push((edge, from));
    }

    fn error(&mut self, domain: Domain, error: &Error) {
        self.errors.push(TraceError::from_error(domain, error));
    }
}

// =============================================================================
// TRACER
// =============================================================================

pub struct Tracer<'a, S> {
    engine: &'a QueryEngine,
    client: Option<&'a IntrospectionClient<S>>,
}

impl<'a, S: LiveService> Tracer<'a, S> {
    /// `client` is `None` in C++-only mode
    pub fn new(engine: &'a QueryEngine, client: Option<&'a IntrospectionClient<S>>) -> Self {
        Self { engine, client }
    }

    /// Breadth-first trace from `seed`
    ///
    /// Lookup failures are recorded on the result and never stop the walk.
    /// Only an unreadable source root is returned as an error.
    pub async fn trace(&self, seed: ReferenceNode, options: &TraceOptions) -> Result<TraceResult> {
        let seed = ReferenceNode::new(seed.domain, seed.id.trim());
        if seed.id.is_empty() {
            return Err(Error::InvalidQuery {
                message: "empty trace seed".to_string(),
            });
        }

        let view = self.engine.view(options.scope.as_deref())?;
        let fanout = options.fanout.max(1);

        let mut state: HashMap<ReferenceNode, NodeState> = HashMap::new();
        let mut seen_edges: HashSet<ReferenceEdge> = HashSet::new();
        let mut seen_errors: HashSet<TraceError> = HashSet::new();
        let mut result = TraceResult {
            seed: seed.clone(),
            nodes: vec![seed.clone()],
            edges: Vec::new(),
            depth_reached: 0,
            truncated_by_depth: false,
            truncated_by_budget: false,
            errors: Vec::new(),
        };

        state.insert(seed.clone(), NodeState::Queued);
        let mut frontier = vec![seed.clone()];
        let mut depth = 0;
        let mut visits = 0;

        while !frontier.is_empty() {
            if depth >= options.max_depth {
                result.truncated_by_depth = true;
                break;
            }
            let remaining = options.max_visits.saturating_sub(visits);
            if remaining == 0 {
                result.truncated_by_budget = true;
                break;
            }
            if frontier.len() > remaining {
                frontier.truncate(remaining);
                result.truncated_by_budget = true;
            }

            let direction = if depth == 0 {
                options.direction
            } else {
                DirectionFilter::Both
            };
            for node in &frontier {
                state.insert(node.clone(), NodeState::Visiting);
            }

            let expansions: Vec<Expansion> = stream::iter(frontier.iter())
                .map(|node| self.expand(&view, node, direction))
                .buffered(fanout)
                .collect()
                .await;
            visits += frontier.len();

            let mut next = Vec::new();
            for (node, expansion) in frontier.iter().zip(expansions) {
                state.insert(node.clone(), NodeState::Visited);

                for error in expansion.errors {
                    if seen_errors.insert(error.clone()) {
                        result.errors.push(error);
                    }
                }

                for (edge, neighbour) in expansion.edges {
                    if options.cross_domain_only && !edge.crosses_domains() {
                        continue;
                    }
                    if seen_edges.insert(edge.clone()) {
                        result.edges.push(edge);
                    }
                    if !state.contains_key(&neighbour) {
                        state.insert(neighbour.clone(), NodeState::Queued);
                        result.nodes.push(neighbour.clone());
                        next.push(neighbour);
                    }
                }
            }

            depth += 1;
            if !next.is_empty() {
                result.depth_reached = depth;
            }
            if result.truncated_by_budget {
                break;
            }
            frontier = next;
        }

        info!(
            seed = %result.seed,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            depth = result.depth_reached,
            errors = result.errors.len(),
            "Trace complete"
        );
        Ok(result)
    }

    /// Blueprints and assets that use a C++ class, one hop away
    pub async fn find_usage(&self, class_name: &str, options: &TraceOptions) -> Result<UsageReport> {
        let options = TraceOptions {
            direction: DirectionFilter::Both,
            max_depth: 1,
            cross_domain_only: true,
            ..options.clone()
        };
        let result = self.trace(ReferenceNode::cpp(class_name), &options).await?;

        Ok(UsageReport {
            class_name: result.seed.id.clone(),
            usages: result.nodes.into_iter().skip(1).collect(),
            errors: result.errors,
        })
    }

    async fn expand(&self, view: &IndexView, node: &ReferenceNode, direction: DirectionFilter) -> Expansion {
        debug!(node = %node, direction = %direction, "Expanding");
        let mut expansion = Expansion::default();
        match node.domain {
            Domain::Cpp => {
                expand_cpp(view, node, direction, &mut expansion);
                if direction.incoming() {
                    self.expand_subclass_blueprints(node, &mut expansion).await;
                }
            }
            Domain::Blueprint | Domain::Asset => {
                self.expand_live(node, direction, &mut expansion).await;
            }
        }
        expansion
    }

    /// cpp -> blueprint: Blueprints parented directly to the class
    async fn expand_subclass_blueprints(&self, node: &ReferenceNode, expansion: &mut Expansion) {
        // C++-only mode is a valid state, not a failure
        let client = match self.client {
            Some(client) => client,
            None => return,
        };
        if !is_identifier(&node.id) {
            return;
        }

        match client.blueprint_search("*", Some(&node.id)).await {
            Ok(found) => {
                let stripped = strip_type_prefix(&node.id);
                for asset in found.iter().filter(|a| !a.is_native()) {
                    let parented = asset
                        .parent_class_name()
                        .map_or(false, |parent| parent == node.id || parent == stripped);
                    if parented {
                        let from = ReferenceNode::blueprint(asset.path.clone());
                        expansion.incoming(node, from, EdgeKind::ParentClass);
                    }
                }
            }
            Err(e) => expansion.error(Domain::Blueprint, &e),
        }
    }

    /// blueprint/asset -> blueprint/asset through the live service
    async fn expand_live(&self, node: &ReferenceNode, direction: DirectionFilter, expansion: &mut Expansion) {
        let client = match self.client {
            Some(client) => client,
            None => {
                let error = Error::ServiceNotConfigured { domain: node.domain };
                expansion.error(node.domain, &error);
                return;
            }
        };

        if direction.outgoing() {
            match client.outgoing(node.domain, &node.id).await {
                Ok(refs) => {
                    for to in live_nodes(&refs) {
                        expansion.outgoing(node, to, EdgeKind::Dependency);
                    }
                }
                Err(e) => expansion.error(node.domain, &e),
            }
        }
        if direction.incoming() {
            match client.incoming(node.domain, &node.id).await {
                Ok(refs) => {
                    for from in live_nodes(&refs) {
                        expansion.incoming(node, from, EdgeKind::Dependency);
                    }
                }
                Err(e) => expansion.error(node.domain, &e),
            }
        }
    }
}

/// cpp -> cpp: indexed bases outward, referencing classes inward
fn expand_cpp(view: &IndexView, node: &ReferenceNode, direction: DirectionFilter, expansion: &mut Expansion) {
    if direction.outgoing() {
        if let Some(symbol) = view.find_class(&node.id) {
            for parent in symbol.parents() {
                if let Some(base) = view.find_class(parent) {
                    let to = ReferenceNode::cpp(base.qualified_name.to_string());
                    expansion.outgoing(node, to, EdgeKind::Inherits);
                }
            }
        }
    }

    if direction.incoming() && is_identifier(&node.id) {
        match search::references(view, &node.id) {
            Ok(occurrences) => {
                let mut referrers: Vec<String> = Vec::new();
                for occurrence in occurrences {
                    let referrer = occurrence
                        .enclosing_class
                        .unwrap_or_else(|| occurrence.file.display().to_string());
                    if referrer != node.id && !referrers.contains(&referrer) {
                        referrers.push(referrer);
                    }
                }
                for referrer in referrers {
                    expansion.incoming(node, ReferenceNode::cpp(referrer), EdgeKind::References);
                }
            }
            Err(e) => expansion.error(Domain::Cpp, &e),
        }
    }
}

/// Service entries as trace nodes; native `/Script/` packages are skipped
fn live_nodes(refs: &[AssetRef]) -> impl Iterator<Item = ReferenceNode> + '_ {
    refs.iter().filter(|r| !r.is_native()).map(|r| {
        if r.looks_like_blueprint() {
            ReferenceNode::blueprint(r.path.clone())
        } else {
            ReferenceNode::asset(r.path.clone())
        }
    })
}

/// Class names only; file-path nodes are leaves
fn is_identifier(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
