//! Cross-domain reference tracing
//!
//! Follows references between C++ classes, Blueprints and content assets
//! with a bounded breadth-first search.
//!
//! @module trace

pub mod traverse;
pub mod types;

pub use traverse::Tracer;
pub use types::{
    DirectionFilter, EdgeKind, ReferenceEdge, ReferenceNode, TraceError, TraceOptions, TraceResult,
    UsageReport,
};
