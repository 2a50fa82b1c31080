//! Query commands: search, hierarchy, refs, details, patterns, exposure
//!
//! @module cli/query

use clap::Args;
use std::path::PathBuf;

use super::Context;
use crate::core::domain::Domain;
use crate::core::error::{Error, Result};
use crate::dispatch::UnifiedRequest;
use crate::query::{QueryMode, SearchRequest};
use crate::trace::DirectionFilter;

// =============================================================================
// ARGS
// =============================================================================

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    ue-analyzer search \"Health Regen\"               Ranked token search
    ue-analyzer search \"Get.*Health\" --mode regex   Line-level regex
    ue-analyzer search Hero -d blueprint --class Character
    ue-analyzer search Rock -d asset --asset-type StaticMesh")]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Domains to search: cpp, blueprint, asset or all (comma separated)
    #[arg(short, long, value_delimiter = ',', default_value = "all")]
    pub domain: Vec<String>,

    /// C++ query mode: smart, regex or tokens
    #[arg(short, long, default_value = "smart")]
    pub mode: String,

    /// Scope: project, engine, plugin or all
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Max results per domain
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// C++ file glob, e.g. `*.h` or `Public/**/*.h`
    #[arg(short, long)]
    pub glob: Option<String>,

    /// Skip matches on C++ comment lines
    #[arg(long)]
    pub no_comments: bool,

    /// Asset class filter for the asset domain
    #[arg(long)]
    pub asset_type: Option<String>,

    /// Parent class filter for the blueprint domain
    #[arg(long)]
    pub class: Option<String>,
}

#[derive(Args, Debug)]
pub struct HierarchyArgs {
    /// Class name, or Blueprint path with `-d blueprint`
    pub name: String,

    #[arg(short, long, default_value = "cpp")]
    pub domain: Domain,

    #[arg(short, long)]
    pub scope: Option<String>,

    /// Leave out implemented interfaces
    #[arg(long)]
    pub no_interfaces: bool,
}

#[derive(Args, Debug)]
pub struct RefsArgs {
    /// Identifier for C++, object path for Blueprints and assets
    pub path: String,

    #[arg(short, long, default_value = "cpp")]
    pub domain: Domain,

    /// outgoing, incoming or both
    #[arg(long, default_value = "both")]
    pub direction: DirectionFilter,

    #[arg(short, long)]
    pub scope: Option<String>,
}

#[derive(Args, Debug)]
pub struct DetailsArgs {
    /// Class name for C++, object path for Blueprints and assets
    pub path: String,

    #[arg(short, long, default_value = "cpp")]
    pub domain: Domain,

    #[arg(short, long)]
    pub scope: Option<String>,

    /// Only members declared on the class itself
    #[arg(long)]
    pub no_inherited: bool,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Header or source file, absolute or relative to a source root
    pub file: PathBuf,
}

// =============================================================================
// HANDLERS
// =============================================================================

pub async fn search(ctx: &Context, args: SearchArgs) -> Result<()> {
    let domains = Domain::parse_list(&args.domain);
    if domains.is_empty() {
        return Err(Error::InvalidQuery {
            message: format!("no known domain in '{}'", args.domain.join(",")),
        });
    }

    let limit = args
        .limit
        .unwrap_or_else(|| ctx.dispatcher.engine().default_limit());
    let mut search = SearchRequest::new(args.query)
        .mode(QueryMode::parse_lenient(&args.mode))
        .max_results(limit)
        .include_comments(!args.no_comments);
    if let Some(scope) = args.scope {
        search = search.scope(scope);
    }
    if let Some(glob) = args.glob {
        search = search.file_glob(glob);
    }

    let mut request = UnifiedRequest::new(search).domains(domains);
    if let Some(asset_type) = args.asset_type {
        request = request.asset_type(asset_type);
    }
    if let Some(class) = args.class {
        request = request.class_filter(class);
    }

    let response = ctx.dispatcher.search(&request).await;
    ctx.print(&response);
    Ok(())
}

pub async fn hierarchy(ctx: &Context, args: HierarchyArgs) -> Result<()> {
    let outcome = ctx
        .dispatcher
        .hierarchy(&args.name, args.domain, args.scope.as_deref(), !args.no_interfaces)
        .await;
    ctx.print(&outcome);
    Ok(())
}

pub async fn refs(ctx: &Context, args: RefsArgs) -> Result<()> {
    let outcome = ctx
        .dispatcher
        .references(&args.path, args.domain, args.direction, args.scope.as_deref())
        .await;
    ctx.print(&outcome);
    Ok(())
}

pub async fn details(ctx: &Context, args: DetailsArgs) -> Result<()> {
    let outcome = ctx
        .dispatcher
        .details(&args.path, args.domain, args.scope.as_deref(), !args.no_inherited)
        .await;
    ctx.print(&outcome);
    Ok(())
}

pub fn patterns(ctx: &Context, args: FileArgs) -> Result<()> {
    let report = ctx.dispatcher.engine().detect_patterns(&args.file)?;
    ctx.print(&report);
    Ok(())
}

pub fn exposure(ctx: &Context, args: FileArgs) -> Result<()> {
    let report = ctx.dispatcher.engine().blueprint_exposure(&args.file)?;
    ctx.print(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;
    use clap::Parser;

    #[test]
    fn test_typed_args() {
        let cli = Cli::parse_from(["ue-analyzer", "refs", "/Game/BP_Hero", "-d", "bp", "--direction", "in"]);
        match cli.command {
            Commands::Refs(args) => {
                assert_eq!(args.domain, Domain::Blueprint);
                assert_eq!(args.direction, DirectionFilter::Incoming);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::parse_from(["ue-analyzer", "search", "Health"]);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(Domain::parse_list(&args.domain), Domain::ALL.to_vec());
                assert_eq!(QueryMode::parse_lenient(&args.mode), QueryMode::Smart);
                assert!(args.limit.is_none());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
