//! Human-readable output formatting

use serde_json::Value;

use super::Report;
use crate::dispatch::{
    DetailsReport, DomainOutcome, HierarchyReport, LiveMatches, ReferenceList, ReferenceReport,
    UnifiedResponse,
};
use crate::query::{BlueprintExposure, FilePatterns, HierarchyNode, Lookup, NodeStatus, SearchResult};
use crate::query::details::ExposedMember;
use crate::trace::{TraceResult, UsageReport};

const PREVIEW_WIDTH: usize = 100;

// =============================================================================
// SEARCH
// =============================================================================

impl Report for UnifiedResponse {
    fn human(&self) -> String {
        let mut output = format!(
            "{} results for '{}' (scope: {})\n",
            self.total_count, self.query, self.scope
        );

        if let Some(outcome) = &self.cpp {
            output.push('\n');
            output.push_str(&outcome_section("C++", outcome, cpp_section));
        }
        if let Some(outcome) = &self.blueprint {
            output.push('\n');
            output.push_str(&outcome_section("Blueprint", outcome, live_section));
        }
        if let Some(outcome) = &self.asset {
            output.push('\n');
            output.push_str(&outcome_section("Asset", outcome, live_section));
        }

        for warning in &self.warnings {
            output.push_str(&format!("\nwarning: {}\n", warning));
        }
        for tip in &self.tips {
            output.push_str(&format!("\ntip: {}\n", tip));
        }
        output
    }
}

fn outcome_section<T>(title: &str, outcome: &DomainOutcome<T>, body: fn(&T) -> String) -> String {
    match outcome {
        DomainOutcome::Found(value) => format!("{}:\n{}", title, body(value)),
        DomainOutcome::NotFound { name } => format!("{}: not found: {}\n", title, name),
        DomainOutcome::Failed(error) => format!("{}: error: {}\n", title, error.error),
    }
}

fn cpp_section(result: &SearchResult) -> String {
    if result.matches.is_empty() {
        return "  (no matches)\n".to_string();
    }

    let mut output = String::new();
    for (i, occurrence) in result.matches.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {}:{}:{}",
            i + 1,
            occurrence.file.display(),
            occurrence.line,
            occurrence.column
        ));
        if let Some(score) = occurrence.score {
            output.push_str(&format!(" ({:.2})", score));
        }
        if let Some(class) = &occurrence.enclosing_class {
            output.push_str(&format!(" in {}", class));
        }
        output.push('\n');
        output.push_str(&format!("     {}\n", preview(&occurrence.context)));
    }
    if result.truncated {
        output.push_str(&format!(
            "  ... {} of {} shown\n",
            result.matches.len(),
            result.total_count
        ));
    }
    output
}

fn live_section(matches: &LiveMatches) -> String {
    if matches.matches.is_empty() {
        return "  (no matches)\n".to_string();
    }

    let mut output = String::new();
    for entry in &matches.matches {
        output.push_str(&format!("  {}", entry.path));
        if let Some(class) = &entry.class {
            output.push_str(&format!(" [{}]", class));
        }
        if let Some(parent) = &entry.parent_class {
            output.push_str(&format!(" : {}", parent));
        }
        output.push('\n');
    }
    if matches.truncated {
        output.push_str("  ... truncated\n");
    }
    output
}

fn preview(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() > PREVIEW_WIDTH {
        let cut: String = line.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

// =============================================================================
// SINGLE ENTITY
// =============================================================================

impl Report for DomainOutcome<HierarchyReport> {
    fn human(&self) -> String {
        outcome_section("Hierarchy", self, |report| match report {
            HierarchyReport::Cpp(hierarchy) => {
                let mut output = format!("  {}\n", hierarchy.chain.join(" -> "));
                if hierarchy.broken {
                    output.push_str("  (inheritance cycle detected)\n");
                }
                output.push('\n');
                tree(&hierarchy.root, 1, &mut output);
                output
            }
            HierarchyReport::Live(value) => pretty_value(value),
        })
    }
}

fn tree(node: &HierarchyNode, depth: usize, output: &mut String) {
    let marker = match node.status {
        NodeStatus::Indexed => "",
        NodeStatus::External => " (not indexed)",
        NodeStatus::Cycle => " (cycle)",
    };
    let kind = if node.is_interface { "interface " } else { "" };
    output.push_str(&format!("{}{}{}{}", "  ".repeat(depth), kind, node.name, marker));
    if let (Some(file), Some(line)) = (&node.file, node.line) {
        output.push_str(&format!("  {}:{}", file.display(), line));
    }
    output.push('\n');
    for parent in &node.parents {
        tree(parent, depth + 1, output);
    }
}

impl Report for DomainOutcome<ReferenceReport> {
    fn human(&self) -> String {
        outcome_section("References", self, |report| {
            let mut output = format!("  {} ({}, {})\n", report.path, report.domain, report.direction);
            if let Some(list) = &report.outgoing {
                output.push_str(&format!("\n  Outgoing ({}):\n", list.len()));
                output.push_str(&reference_list(list));
            }
            if let Some(list) = &report.incoming {
                output.push_str(&format!("\n  Incoming ({}):\n", list.len()));
                output.push_str(&reference_list(list));
            }
            output
        })
    }
}

fn reference_list(list: &ReferenceList) -> String {
    let mut output = String::new();
    match list {
        ReferenceList::Source(occurrences) => {
            for occurrence in occurrences {
                output.push_str(&format!(
                    "    {}:{}  {}\n",
                    occurrence.file.display(),
                    occurrence.line,
                    preview(&occurrence.context)
                ));
            }
        }
        ReferenceList::Live(entries) => {
            for entry in entries {
                output.push_str(&format!("    {}\n", entry.path));
            }
        }
    }
    output
}

impl Report for DomainOutcome<DetailsReport> {
    fn human(&self) -> String {
        outcome_section("Details", self, |report| match report {
            DetailsReport::Cpp(details) => {
                let class = &details.class;
                let mut output = format!(
                    "  {} ({}:{})\n",
                    class.qualified_name,
                    class.file.display(),
                    class.line_start
                );
                let parents: Vec<&str> = class.parents().map(|p| p.as_str()).collect();
                if !parents.is_empty() {
                    output.push_str(&format!("  bases: {}\n", parents.join(", ")));
                }
                if !details.inherited_from.is_empty() {
                    output.push_str(&format!("  inherits members from: {}\n", details.inherited_from.join(", ")));
                }

                output.push_str(&format!("\n  Properties ({}):\n", details.properties.len()));
                for member in &details.properties {
                    output.push_str(&member_line(
                        member.name.as_deref(),
                        &member.specifiers,
                        member.blueprint_exposed,
                        &member.declared_in,
                        &class.qualified_name,
                    ));
                }
                output.push_str(&format!("\n  Functions ({}):\n", details.functions.len()));
                for member in &details.functions {
                    output.push_str(&member_line(
                        member.name.as_deref(),
                        &member.specifiers,
                        member.blueprint_exposed,
                        &member.declared_in,
                        &class.qualified_name,
                    ));
                }
                output
            }
            DetailsReport::Live(value) => pretty_value(value),
        })
    }
}

fn member_line(name: Option<&str>, specifiers: &str, exposed: bool, declared_in: &str, class: &str) -> String {
    let mut line = format!("    {}", name.unwrap_or("<unnamed>"));
    if exposed {
        line.push_str(" [BP]");
    }
    if !specifiers.is_empty() {
        line.push_str(&format!(" ({})", specifiers));
    }
    if declared_in != class {
        line.push_str(&format!(" from {}", declared_in));
    }
    line.push('\n');
    line
}

fn pretty_value(value: &Value) -> String {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let mut output = String::new();
    for line in text.lines() {
        output.push_str(&format!("  {}\n", line));
    }
    output
}

// =============================================================================
// FILE REPORTS
// =============================================================================

impl Report for Lookup<FilePatterns> {
    fn human(&self) -> String {
        let patterns = match self {
            Lookup::Found(patterns) => patterns,
            Lookup::NotFound { name } => return format!("File not found: {}\n", name),
        };

        let mut output = format!("{}\n", patterns.file.display());
        for class in &patterns.classes {
            let marker = class.type_annotation().map_or("-", |a| a.kind.as_str());
            output.push_str(&format!(
                "  {} {} (line {})\n",
                marker, class.qualified_name, class.line_start
            ));
        }
        output.push('\n');
        for annotation in &patterns.macros {
            output.push_str(&format!(
                "  {:>4}  {}({})",
                annotation.line,
                annotation.kind.as_str(),
                annotation.raw
            ));
            if let Some(member) = &annotation.member {
                output.push_str(&format!(" {}", member));
            }
            output.push('\n');
        }
        let counts: Vec<String> = patterns
            .counts
            .iter()
            .map(|(name, count)| format!("{} {}", count, name))
            .collect();
        if !counts.is_empty() {
            output.push_str(&format!("\n  {}\n", counts.join(", ")));
        }
        output
    }
}

impl Report for Lookup<BlueprintExposure> {
    fn human(&self) -> String {
        let exposure = match self {
            Lookup::Found(exposure) => exposure,
            Lookup::NotFound { name } => return format!("File not found: {}\n", name),
        };

        let mut output = format!(
            "{} ({} exposed members)\n",
            exposure.file.display(),
            exposure.total()
        );
        for class in &exposure.classes {
            let mut tags = Vec::new();
            if class.blueprintable {
                tags.push("Blueprintable");
            }
            if class.blueprint_type {
                tags.push("BlueprintType");
            }
            output.push_str(&format!("  {} [{}]\n", class.name, tags.join(", ")));
        }

        let groups: [(&str, &Vec<ExposedMember>); 6] = [
            ("Callable functions", &exposure.callable_functions),
            ("Pure functions", &exposure.pure_functions),
            ("Events", &exposure.events),
            ("Read-write properties", &exposure.read_write_properties),
            ("Read-only properties", &exposure.read_only_properties),
            ("Assignable delegates", &exposure.assignable_delegates),
        ];
        for (title, members) in groups {
            if members.is_empty() {
                continue;
            }
            output.push_str(&format!("\n  {} ({}):\n", title, members.len()));
            for member in members {
                output.push_str(&format!("    {}::{} (line {})\n", member.class, member.name, member.line));
            }
        }
        output
    }
}

// =============================================================================
// TRACE
// =============================================================================

impl Report for TraceResult {
    fn human(&self) -> String {
        let mut output = format!(
            "Trace from {}: {} nodes, {} edges, depth {}\n",
            self.seed,
            self.nodes.len(),
            self.edges.len(),
            self.depth_reached
        );
        if self.truncated_by_depth {
            output.push_str("  (stopped at the depth limit)\n");
        }
        if self.truncated_by_budget {
            output.push_str("  (stopped at the visit budget)\n");
        }

        output.push('\n');
        for edge in &self.edges {
            output.push_str(&format!("  {} --{}--> {}\n", edge.from, edge.kind.as_str(), edge.to));
        }
        for error in &self.errors {
            output.push_str(&format!("\n  error ({}): {}", error.domain, error.message));
        }
        if !self.errors.is_empty() {
            output.push('\n');
        }
        output
    }
}

impl Report for UsageReport {
    fn human(&self) -> String {
        let mut output = if self.usages.is_empty() {
            format!("No Blueprint or asset usage found for {}\n", self.class_name)
        } else {
            format!("{} is used by {} entries:\n", self.class_name, self.usages.len())
        };
        for node in &self.usages {
            output.push_str(&format!("  {}\n", node));
        }
        for error in &self.errors {
            output.push_str(&format!("  error ({}): {}\n", error.domain, error.message));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AssetRef;
    use crate::core::domain::Domain;
    use crate::dispatch::DomainError;
    use crate::query::QueryMode;
    use crate::scope::SearchScope;
    use crate::trace::ReferenceNode;

    #[test]
    fn test_unified_response_sections() {
        let response = UnifiedResponse {
            query: "Hero".to_string(),
            scope: SearchScope::Project,
            domains_searched: vec![Domain::Cpp, Domain::Blueprint, Domain::Asset],
            ok: false,
            total_count: 1,
            cpp: Some(DomainOutcome::Found(SearchResult::empty(QueryMode::Smart, Vec::new()))),
            blueprint: Some(DomainOutcome::Found(LiveMatches {
                matches: vec![AssetRef::from_path("/Game/BP_Hero")],
                count: 1,
                truncated: false,
            })),
            asset: Some(DomainOutcome::Failed(DomainError {
                domain: Domain::Asset,
                error: "connection refused".to_string(),
            })),
            errors: Vec::new(),
            warnings: Vec::new(),
            tips: Vec::new(),
        };

        let text = response.human();
        assert!(text.starts_with("1 results for 'Hero' (scope: project)"));
        assert!(text.contains("C++:\n  (no matches)"));
        assert!(text.contains("  /Game/BP_Hero\n"));
        assert!(text.contains("Asset: error: connection refused"));
    }

    #[test]
    fn test_usage_report() {
        let report = UsageReport {
            class_name: "UHealthComponent".to_string(),
            usages: vec![ReferenceNode::blueprint("/Game/BP_Medic")],
            errors: Vec::new(),
        };
        assert!(report.human().contains("blueprint:/Game/BP_Medic"));
    }

    #[test]
    fn test_preview_is_char_safe() {
        let long = "é".repeat(150);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_WIDTH);
    }
}
