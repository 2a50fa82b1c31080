//! Config command: resolved configuration and scope roots
//!
//! @module cli/config

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::output::{render, OutputFormat, Report};
use crate::scope::{ScopeResolver, SearchScope, SourceRoot};

const SCOPES: [SearchScope; 4] = [
    SearchScope::Project,
    SearchScope::Engine,
    SearchScope::Plugin,
    SearchScope::All,
];

#[derive(Debug, Serialize)]
pub struct ConfigReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    pub config: Config,
    pub roots: Vec<SourceRoot>,
    pub scopes: BTreeMap<&'static str, Vec<PathBuf>>,
    /// Base URL of the live service, `None` in C++-only mode
    pub live_service: Option<String>,
}

impl ConfigReport {
    pub fn build(config: &Config, config_path: Option<&Path>) -> Result<Self> {
        let resolver = ScopeResolver::from_config(&config.sources)?;
        let scopes = SCOPES
            .iter()
            .map(|scope| (scope.as_str(), resolver.resolve_scope(*scope)))
            .collect();

        Ok(Self {
            config_path: config_path
                .map(Path::to_path_buf)
                .or_else(|| Config::config_path().ok()),
            config: config.clone(),
            roots: resolver.roots().to_vec(),
            scopes,
            live_service: config.service.base_url()?.map(|url| url.to_string()),
        })
    }
}

impl Report for ConfigReport {
    fn human(&self) -> String {
        let mut output = String::new();
        if let Some(path) = &self.config_path {
            output.push_str(&format!("Config file: {}\n", path.display()));
        }
        output.push_str(&format!("Default scope: {}\n", self.config.sources.default_scope));
        output.push_str(&format!(
            "Live service: {}\n",
            self.live_service.as_deref().unwrap_or("not configured (C++-only mode)")
        ));

        output.push_str(&format!("\nSource roots ({}):\n", self.roots.len()));
        for root in &self.roots {
            output.push_str(&format!("  {:<15} {}\n", root.origin.as_str(), root.path.display()));
        }

        output.push_str("\nScopes:\n");
        for (scope, paths) in &self.scopes {
            output.push_str(&format!("  {} ({} roots)\n", scope, paths.len()));
            for path in paths {
                output.push_str(&format!("    {}\n", path.display()));
            }
        }
        output
    }
}

pub fn run(config: &Config, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let report = ConfigReport::build(config, config_path)?;
    print!("{}", render(&report, format));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_lists_scopes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("Source");
        std::fs::create_dir_all(&source).unwrap();

        let mut config = Config::default();
        config.sources.project_source = Some(source.clone());
        config.service.host = Some("127.0.0.1".to_string());

        let report = ConfigReport::build(&config, Some(&temp.path().join("config.toml"))).unwrap();
        assert_eq!(report.roots.len(), 1);
        assert!(report.scopes["project"].contains(&source));
        assert!(report.scopes["engine"].is_empty());
        assert_eq!(report.live_service.as_deref(), Some("http://127.0.0.1:8080/"));

        let text = report.human();
        assert!(text.contains("project_source"));
        assert!(text.contains("engine (0 roots)"));
    }
}
