//! Trace and usage commands
//!
//! @module cli/trace

use clap::Args;

use super::Context;
use crate::core::domain::Domain;
use crate::core::error::Result;
use crate::trace::{DirectionFilter, ReferenceNode};

#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    ue-analyzer trace UHealthComponent                    Both directions, config depth
    ue-analyzer trace UHealthComponent --direction in     Who uses the class
    ue-analyzer trace /Game/BP_Hero -d blueprint --depth 2
    ue-analyzer trace /Game/M_Skin -d asset --max-visits 50")]
pub struct TraceArgs {
    /// Seed: class name for C++, object path for Blueprints and assets
    pub seed: String,

    #[arg(short, long, default_value = "cpp")]
    pub domain: Domain,

    /// Seed direction: outgoing, incoming or both
    #[arg(long, default_value = "both")]
    pub direction: DirectionFilter,

    /// Maximum BFS depth (default from config)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Maximum node expansions (default from config)
    #[arg(long)]
    pub max_visits: Option<usize>,

    /// Scope for C++ lookups
    #[arg(short, long)]
    pub scope: Option<String>,
}

#[derive(Args, Debug)]
pub struct UsageArgs {
    /// C++ class name
    pub class: String,

    /// Scope for C++ lookups
    #[arg(short, long)]
    pub scope: Option<String>,
}

pub async fn trace(ctx: &Context, args: TraceArgs) -> Result<()> {
    let mut options = ctx.dispatcher.trace_options().direction(args.direction);
    if let Some(depth) = args.depth {
        options = options.max_depth(depth);
    }
    if let Some(max_visits) = args.max_visits {
        options = options.max_visits(max_visits);
    }
    if let Some(scope) = args.scope {
        options = options.scope(scope);
    }

    let result = ctx
        .dispatcher
        .trace(ReferenceNode::new(args.domain, args.seed), &options)
        .await?;
    ctx.print(&result);
    Ok(())
}

pub async fn usage(ctx: &Context, args: UsageArgs) -> Result<()> {
    let mut options = ctx.dispatcher.trace_options();
    if let Some(scope) = args.scope {
        options = options.scope(scope);
    }

    let report = ctx.dispatcher.find_usage(&args.class, &options).await?;
    ctx.print(&report);
    Ok(())
}
