//! CLI command definitions and handlers

pub mod config;
pub mod query;
pub mod trace;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::client::{HttpService, IntrospectionClient};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::dispatch::Dispatcher;
use crate::index::IndexStore;
use crate::output::{render, OutputFormat, Report};
use crate::query::QueryEngine;
use crate::scope::{ScopeResolver, SearchScope};

const LONG_ABOUT: &str = r#"
Source intelligence for Unreal Engine projects.

Indexes project, plugin and engine C++ sources on demand and, when a live
editor session is reachable, joins them with Blueprint and asset data.

SCOPES:
    project    Project source and project plugins (default)
    engine     Engine source and engine plugins
    plugin     Plugin sources only
    all        Everything registered

ENVIRONMENT:
    CPP_SOURCE_PATH        Project C++ source root
    UNREAL_ENGINE_PATH     Engine root
    UE_PLUGIN_HOST         Live service host (unset = C++-only mode)
    UE_PLUGIN_PORT         Live service port (default 8080)
    DEFAULT_SEARCH_SCOPE   Scope used when none is given
    UE_ANALYZER_LOG        Log filter, e.g. `ue_analyzer=debug`

EXAMPLES:
    ue-analyzer search "Health Regen"              Ranked C++ search
    ue-analyzer search Hero -d blueprint,asset     Live domains only
    ue-analyzer hierarchy UHealthComponent         Inheritance chain
    ue-analyzer refs /Game/BP_Hero -d blueprint    Blueprint references
    ue-analyzer trace UHealthComponent --depth 2   Cross-domain trace
    ue-analyzer usage UHealthComponent             Blueprints using a class
"#;

/// Unreal Engine source intelligence
#[derive(Parser, Debug)]
#[command(name = "ue-analyzer")]
#[command(author, version)]
#[command(about = "Scoped C++ indexing and cross-domain reference tracing for Unreal projects")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides applied on top of config file and environment
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Config file (default: platform config dir or $UE_ANALYZER_HOME)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project C++ source root
    #[arg(long, global = true)]
    pub source: Option<PathBuf>,

    /// Engine root
    #[arg(long, global = true)]
    pub engine: Option<PathBuf>,

    /// Live service host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Live service port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Default scope
    #[arg(long = "default-scope", global = true)]
    pub default_scope: Option<SearchScope>,

    /// JSON output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search C++, Blueprints and assets
    #[command(visible_alias = "s")]
    Search(query::SearchArgs),

    /// Show the inheritance hierarchy of a class or Blueprint
    #[command(visible_alias = "h")]
    Hierarchy(query::HierarchyArgs),

    /// Show what an item references and what references it
    #[command(visible_alias = "r")]
    Refs(query::RefsArgs),

    /// Show properties, functions and metadata of an item
    #[command(visible_alias = "d")]
    Details(query::DetailsArgs),

    /// List every UE macro in a C++ file
    Patterns(query::FileArgs),

    /// Summarize the Blueprint-facing API of a C++ file
    Exposure(query::FileArgs),

    /// Trace references across C++, Blueprints and assets
    #[command(visible_alias = "t")]
    Trace(trace::TraceArgs),

    /// Find Blueprints and assets that use a C++ class
    #[command(visible_alias = "u")]
    Usage(trace::UsageArgs),

    /// Print the resolved configuration and scope roots
    Config,
}

impl GlobalArgs {
    /// Command-line values win over file and environment
    pub fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.sources.project_source = Some(source.clone());
        }
        if let Some(engine) = &self.engine {
            config.sources.engine_root = Some(engine.clone());
        }
        if let Some(host) = &self.host {
            config.service.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.service.port = port;
        }
        if let Some(scope) = self.default_scope {
            config.sources.default_scope = scope;
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = Config::load_from(path)?;
                config.apply_overrides(|key| std::env::var(key).ok());
                config
            }
            None => Config::load()?,
        };
        self.apply(&mut config);
        Ok(config)
    }
}

/// Everything a command needs, built once per invocation
pub struct Context {
    pub config: Config,
    pub dispatcher: Dispatcher<HttpService>,
    pub format: OutputFormat,
}

impl Context {
    pub fn from_config(config: Config, format: OutputFormat) -> Result<Self> {
        let resolver = ScopeResolver::from_config(&config.sources)?;
        info!(
            roots = resolver.roots().len(),
            default_scope = %resolver.default_scope(),
            "Resolved source roots"
        );

        let store = Arc::new(IndexStore::new(&config.index)?);
        let engine = QueryEngine::new(store, Arc::new(resolver), &config.search);

        let client = HttpService::from_config(&config.service)?.map(IntrospectionClient::new);
        match client.as_ref() {
            Some(client) => info!(url = %client.service().base_url(), "Live service configured"),
            None => info!("No live service configured, running in C++-only mode"),
        }

        let dispatcher = Dispatcher::new(Arc::new(engine), client, config.trace.clone());
        Ok(Self {
            config,
            dispatcher,
            format,
        })
    }

    pub fn print<R: Report>(&self, report: &R) {
        let text = render(report, self.format);
        if text.ends_with('\n') {
            print!("{}", text);
        } else {
            println!("{}", text);
        }
    }
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.global.load_config()?;
    let format = OutputFormat::from_flag(cli.global.json);

    if let Commands::Config = cli.command {
        return config::run(&config, cli.global.config.as_deref(), format);
    }

    let ctx = Context::from_config(config, format)?;
    match cli.command {
        Commands::Search(args) => query::search(&ctx, args).await,
        Commands::Hierarchy(args) => query::hierarchy(&ctx, args).await,
        Commands::Refs(args) => query::refs(&ctx, args).await,
        Commands::Details(args) => query::details(&ctx, args).await,
        Commands::Patterns(args) => query::patterns(&ctx, args),
        Commands::Exposure(args) => query::exposure(&ctx, args),
        Commands::Trace(args) => trace::trace(&ctx, args).await,
        Commands::Usage(args) => trace::usage(&ctx, args).await,
        Commands::Config => Ok(()),
    }
}
