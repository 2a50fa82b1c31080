//! Output formatting

pub mod human;
pub mod json;

use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A result that can be printed for people or for scripts
pub trait Report: Serialize {
    fn human(&self) -> String;
}

/// Format a report for output
pub fn render<R: Report>(report: &R, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => report.human(),
        OutputFormat::Json => json::format(report),
    }
}
