//! ue-analyzer - Source intelligence for Unreal Engine projects
//!
//! Scoped, on-demand indexing of project, plugin and engine C++ sources,
//! joined with Blueprint and asset data from a live editor session when
//! one is reachable.

pub mod cli;
pub mod client;
pub mod core;
pub mod dispatch;
pub mod index;
pub mod output;
pub mod parse;
pub mod query;
pub mod scope;
pub mod trace;

pub use crate::core::config::Config;
pub use crate::core::domain::Domain;
pub use crate::core::error::{Error, Result};
