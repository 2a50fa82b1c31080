//! Class details and per-file exposure reports

use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::results::Lookup;
use crate::index::{ClassSymbol, ExposureAnnotation, ExposureFlags, IndexView, MacroKind};
use crate::parse::ParsedFile;

// =============================================================================
// CLASS DETAILS
// =============================================================================

/// A reflected property or function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: MacroKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
    pub specifiers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub flags: ExposureFlags,
    pub blueprint_exposed: bool,
    pub line: u32,
    /// Class that declares the member
    pub declared_in: String,
    pub file: PathBuf,
}

impl MemberInfo {
    fn from_annotation(annotation: &ExposureAnnotation, owner: &ClassSymbol) -> Self {
        Self {
            name: annotation.member.clone(),
            kind: annotation.kind,
            declaration: annotation.declaration.clone(),
            specifiers: annotation.raw.clone(),
            category: annotation.category.clone(),
            flags: annotation.flags,
            blueprint_exposed: annotation.is_blueprint_exposed(),
            line: annotation.line,
            declared_in: owner.qualified_name.to_string(),
            file: owner.file.clone(),
        }
    }
}

/// Blueprint-facing counts over the reported members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExposureSummary {
    pub blueprintable: bool,
    pub blueprint_type: bool,
    pub blueprint_properties: usize,
    pub blueprint_functions: usize,
    pub blueprint_events: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDetails {
    pub class: ClassSymbol,
    pub properties: Vec<MemberInfo>,
    pub functions: Vec<MemberInfo>,
    /// Indexed ancestors whose members were merged, nearest first
    pub inherited_from: Vec<String>,
    pub summary: ExposureSummary,
}

/// Full symbol plus aggregated exposure
pub fn details(view: &IndexView, name: &str, include_inherited: bool) -> Lookup<ClassDetails> {
    let class = match view.find_class(name) {
        Some(class) => class,
        None => return Lookup::not_found(name.trim()),
    };

    let mut owners = vec![class];
    if include_inherited {
        owners.extend(ancestors(view, class));
    }

    let mut properties = Vec::new();
    let mut functions = Vec::new();
    for owner in &owners {
        properties.extend(owner.properties().map(|a| MemberInfo::from_annotation(a, owner)));
        functions.extend(owner.functions().map(|a| MemberInfo::from_annotation(a, owner)));
    }

    let summary = summarize(class, &properties, &functions);

    Lookup::Found(ClassDetails {
        class: class.clone(),
        inherited_from: owners[1..]
            .iter()
            .map(|c| c.qualified_name.to_string())
            .collect(),
        properties,
        functions,
        summary,
    })
}

/// Indexed ancestors breadth-first, each once
fn ancestors<'a>(view: &'a IndexView, class: &'a ClassSymbol) -> Vec<&'a ClassSymbol> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(class.qualified_name.to_string());

    let mut queue: VecDeque<&ClassSymbol> = VecDeque::new();
    queue.push_back(class);
    let mut found = Vec::new();

    while let Some(current) = queue.pop_front() {
        for parent in current.parents() {
            if let Some(symbol) = view.find_class(parent) {
                if seen.insert(symbol.qualified_name.to_string()) {
                    found.push(symbol);
                    queue.push_back(symbol);
                }
            }
        }
    }

    found
}

fn summarize(class: &ClassSymbol, properties: &[MemberInfo], functions: &[MemberInfo]) -> ExposureSummary {
    let marker = class
        .type_annotation()
        .map(|a| a.flags)
        .unwrap_or_default();
    let events = ExposureFlags::BLUEPRINT_IMPLEMENTABLE_EVENT | ExposureFlags::BLUEPRINT_NATIVE_EVENT;

    ExposureSummary {
        blueprintable: marker.contains(ExposureFlags::BLUEPRINTABLE),
        blueprint_type: marker.contains(ExposureFlags::BLUEPRINT_TYPE),
        blueprint_properties: properties.iter().filter(|p| p.blueprint_exposed).count(),
        blueprint_functions: functions.iter().filter(|f| f.blueprint_exposed).count(),
        blueprint_events: functions.iter().filter(|f| f.flags.intersects(events)).count(),
    }
}

// =============================================================================
// FILE REPORTS
// =============================================================================

/// Every UE macro in one file
#[derive(Debug, Clone, Serialize)]
pub struct FilePatterns {
    pub file: PathBuf,
    pub classes: Vec<ClassSymbol>,
    pub macros: Vec<ExposureAnnotation>,
    /// Occurrences per macro name
    pub counts: BTreeMap<&'static str, usize>,
}

pub fn file_patterns(path: &Path, parsed: &ParsedFile) -> FilePatterns {
    let mut counts = BTreeMap::new();
    for annotation in &parsed.annotations {
        *counts.entry(annotation.kind.as_str()).or_insert(0) += 1;
    }

    FilePatterns {
        file: path.to_path_buf(),
        classes: parsed.classes.clone(),
        macros: parsed.annotations.clone(),
        counts,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposedMember {
    pub name: String,
    pub class: String,
    pub line: u32,
    pub specifiers: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposedClass {
    pub name: String,
    pub blueprintable: bool,
    pub blueprint_type: bool,
}

/// Blueprint-facing API declared in one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlueprintExposure {
    pub file: PathBuf,
    pub classes: Vec<ExposedClass>,
    pub callable_functions: Vec<ExposedMember>,
    pub pure_functions: Vec<ExposedMember>,
    pub events: Vec<ExposedMember>,
    pub read_write_properties: Vec<ExposedMember>,
    pub read_only_properties: Vec<ExposedMember>,
    pub assignable_delegates: Vec<ExposedMember>,
}

impl BlueprintExposure {
    pub fn total(&self) -> usize {
        self.callable_functions.len()
            + self.pure_functions.len()
            + self.events.len()
            + self.read_write_properties.len()
            + self.read_only_properties.len()
            + self.assignable_delegates.len()
    }
}

pub fn blueprint_exposure(path: &Path, parsed: &ParsedFile) -> BlueprintExposure {
    let mut report = BlueprintExposure {
        file: path.to_path_buf(),
        ..BlueprintExposure::default()
    };

    for class in parsed.classes.iter().filter(|c| !c.is_forward) {
        let marker = class.type_annotation().map(|a| a.flags).unwrap_or_default();
        if marker.intersects(ExposureFlags::BLUEPRINTABLE | ExposureFlags::BLUEPRINT_TYPE) {
            report.classes.push(ExposedClass {
                name: class.qualified_name.to_string(),
                blueprintable: marker.contains(ExposureFlags::BLUEPRINTABLE),
                blueprint_type: marker.contains(ExposureFlags::BLUEPRINT_TYPE),
            });
        }

        for annotation in class.annotations.iter().filter(|a| a.kind.is_member_marker()) {
            let member = ExposedMember {
                name: annotation.member.clone().unwrap_or_default(),
                class: class.qualified_name.to_string(),
                line: annotation.line,
                specifiers: annotation.raw.clone(),
            };
            let flags = annotation.flags;

            let bucket = match annotation.kind {
                MacroKind::UFunction if flags.contains(ExposureFlags::BLUEPRINT_PURE) => {
                    &mut report.pure_functions
                }
                MacroKind::UFunction if flags.contains(ExposureFlags::BLUEPRINT_CALLABLE) => {
                    &mut report.callable_functions
                }
                MacroKind::UFunction
                    if flags.intersects(
                        ExposureFlags::BLUEPRINT_IMPLEMENTABLE_EVENT
                            | ExposureFlags::BLUEPRINT_NATIVE_EVENT,
                    ) =>
                {
                    &mut report.events
                }
                MacroKind::UProperty if flags.contains(ExposureFlags::BLUEPRINT_ASSIGNABLE) => {
                    &mut report.assignable_delegates
                }
                MacroKind::UProperty if flags.contains(ExposureFlags::BLUEPRINT_READ_WRITE) => {
                    &mut report.read_write_properties
                }
                MacroKind::UProperty if flags.contains(ExposureFlags::BLUEPRINT_READ_ONLY) => {
                    &mut report.read_only_properties
                }
                _ => continue,
            };
            bucket.push(member);
        }
    }

    report
}
