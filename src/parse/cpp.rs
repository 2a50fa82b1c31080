//! C++ Declaration Extraction
//!
//! Regex and brace-matching extraction of the structure the query engine
//! needs from Unreal C++ headers and sources:
//! - class/struct declarations with base and interface lists
//! - body spans for nesting and member attribution
//! - UE reflection macros with their raw specifier text
//! - comment-only lines
//!
//! This is not a C++ parser. Preprocessor conditionals are ignored and
//! macro-generated declarations are invisible.
//!
//! @module parse/cpp

use crate::index::symbols::{
    is_interface_name, ClassKind, ClassSymbol, ExposureAnnotation, ExposureFlags, MacroKind,
};
use compact_str::CompactString;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::path::Path;
use thiserror::Error;

/// Bytes of declaration text examined after a member macro
const DECLARATION_WINDOW: usize = 512;

// =============================================================================
// COMPILED REGEX PATTERNS
// =============================================================================

/// `UCLASS(...)`, `UPROPERTY(...)` and friends, up to the opening paren
static MACRO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(UCLASS|USTRUCT|UINTERFACE|UENUM|UPROPERTY|UFUNCTION|UDELEGATE)\s*\(").unwrap()
});

/// Class or struct declaration head, up to `{` or `;`
///
/// Groups: 1 template prefix, 2 keyword, 3 leading words (API macros),
/// 4 name, 5 final, 6 base list, 7 terminator
static CLASS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(template\s*<[^;{]*?>\s*)?\b(class|struct)\s+((?:[A-Za-z_]\w*\s+)*?)([A-Za-z_]\w*)\s*(?:<[^;{]*?>\s*)?(final\s*)?(?::([^;{]*))?([;{])",
    )
    .unwrap()
});

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_]\w*").unwrap());

static ENUM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*enum\s+(?:class\s+|struct\s+)?([A-Za-z_]\w*)").unwrap());

// =============================================================================
// TYPES
// =============================================================================

/// Why a file could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("file contains NUL bytes (binary)")]
    Binary,

    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment { line: u32 },

    #[error("file is not valid UTF-8")]
    InvalidUtf8,
}

/// Structure recovered from one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    /// In source order
    pub classes: Vec<ClassSymbol>,
    /// Every UE macro in the file, in source order
    pub annotations: Vec<ExposureAnnotation>,
    /// `comment_lines[n]` is true when line `n + 1` holds only comment text
    pub comment_lines: Vec<bool>,
    /// Source with comment bytes blanked; offsets and newlines preserved
    pub code: String,
}

struct MacroSite {
    annotation: ExposureAnnotation,
    start: usize,
    end: usize,
}

struct ClassSite {
    symbol: ClassSymbol,
    /// Byte range of the body between the braces
    body: Option<(usize, usize)>,
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Parse raw file bytes
pub fn parse_bytes(path: &Path, bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    if bytes.contains(&0) {
        return Err(ParseError::Binary);
    }
    let content = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    parse_source(path, content)
}

/// Parse C++ source text
pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile, ParseError> {
    let Stripped {
        code,
        comment_lines,
    } = strip_comments(content)?;
    let lines = LineIndex::new(content);

    let macros = find_macros(&code, &lines);
    let mut sites = find_classes(path, &code, &lines);

    attach_type_macros(&code, &mut sites, &macros);
    attach_member_macros(&mut sites, &macros);
    qualify_nested(&mut sites);

    let mut annotations: Vec<ExposureAnnotation> =
        macros.into_iter().map(|m| m.annotation).collect();
    // Type markers learn their class name once attached
    for site in &sites {
        if let Some(marker) = site.symbol.type_annotation() {
            if let Some(a) = annotations
                .iter_mut()
                .find(|a| a.line == marker.line && a.kind == marker.kind)
            {
                a.member = marker.member.clone();
            }
        }
    }

    Ok(ParsedFile {
        classes: sites.into_iter().map(|s| s.symbol).collect(),
        annotations,
        comment_lines,
        code,
    })
}

// =============================================================================
// COMMENTS
// =============================================================================

struct Stripped {
    /// Source with comment bytes blanked; byte offsets and newlines preserved
    code: String,
    comment_lines: Vec<bool>,
}

fn strip_comments(content: &str) -> Result<Stripped, ParseError> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Line,
        Block,
        Literal(u8),
    }

    let bytes = content.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut comment_lines = Vec::new();
    let mut has_code = false;
    let mut has_comment = false;
    let mut block_line = 0u32;
    let mut state = State::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if b == b'\n' {
            comment_lines.push(has_comment && !has_code);
            has_code = false;
            has_comment = false;
            if matches!(state, State::Line | State::Literal(_)) {
                state = State::Code;
            }
            out.push(b'\n');
            i += 1;
            continue;
        }

        match state {
            State::Code => {
                if b == b'/' && next == Some(b'/') {
                    state = State::Line;
                    has_comment = true;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                if b == b'/' && next == Some(b'*') {
                    state = State::Block;
                    has_comment = true;
                    block_line = comment_lines.len() as u32 + 1;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                if b == b'"' || b == b'\'' {
                    state = State::Literal(b);
                }
                if !b.is_ascii_whitespace() {
                    has_code = true;
                }
                out.push(b);
            }
            State::Line => out.push(b' '),
            State::Block => {
                has_comment = true;
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(b' ');
            }
            State::Literal(quote) => {
                has_code = true;
                out.push(b);
                if b == b'\\' {
                    if let Some(n) = next.filter(|n| *n != b'\n') {
                        out.push(n);
                        i += 2;
                        continue;
                    }
                } else if b == quote {
                    state = State::Code;
                }
            }
        }
        i += 1;
    }
    comment_lines.push(has_comment && !has_code);

    if state == State::Block {
        return Err(ParseError::UnterminatedComment { line: block_line });
    }

    let code = String::from_utf8(out).map_err(|_| ParseError::InvalidUtf8)?;
    Ok(Stripped {
        code,
        comment_lines,
    })
}

// =============================================================================
// LINES
// =============================================================================

struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// 1-indexed line containing `offset`
    fn line_of(&self, offset: usize) -> u32 {
        match self.starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }
}

// =============================================================================
// MACROS
// =============================================================================

fn find_macros(code: &str, lines: &LineIndex) -> Vec<MacroSite> {
    let bytes = code.as_bytes();
    let mut sites = Vec::new();

    for caps in MACRO_PATTERN.captures_iter(code) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let kind = match caps.get(1).and_then(|m| MacroKind::from_name(m.as_str())) {
            Some(kind) => kind,
            None => continue,
        };

        let open = whole.end() - 1;
        let close = match find_matching(bytes, open, b'(', b')') {
            Some(close) => close,
            None => continue,
        };

        let raw = collapse_whitespace(&code[open + 1..close]);
        let (member, declaration) = member_declaration(kind, &code[close + 1..]);

        sites.push(MacroSite {
            annotation: ExposureAnnotation {
                kind,
                flags: parse_flags(&raw),
                category: specifier_value(&raw, "category"),
                raw,
                member,
                declaration,
                line: lines.line_of(whole.start()),
            },
            start: whole.start(),
            end: close + 1,
        });
    }

    sites
}

/// Split specifiers on top-level commas
fn specifiers(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth -= 1,
            ',' if !in_string && depth == 0 => {
                parts.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(raw[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

fn parse_flags(raw: &str) -> ExposureFlags {
    specifiers(raw)
        .into_iter()
        .map(|spec| spec.split('=').next().unwrap_or(spec))
        .fold(ExposureFlags::empty(), |acc, key| {
            acc | ExposureFlags::from_specifier(key)
        })
}

/// Value of a `Key = Value` specifier, quotes removed
fn specifier_value(raw: &str, key: &str) -> Option<String> {
    specifiers(raw).into_iter().find_map(|spec| {
        let (k, v) = spec.split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Recover the declared name and declaration text following a macro
fn member_declaration(kind: MacroKind, rest: &str) -> (Option<String>, Option<String>) {
    let window = truncate_at_char_boundary(rest, DECLARATION_WINDOW);

    match kind {
        MacroKind::UFunction => {
            let end = window.find([';', '{']).unwrap_or(window.len());
            let decl = &window[..end];
            let name = decl
                .find('(')
                .and_then(|paren| last_identifier(&decl[..paren]));
            (name, non_empty(collapse_whitespace(decl)))
        }
        MacroKind::UProperty => {
            let end = window.find(';').unwrap_or(window.len());
            let decl = &window[..end];
            let head = property_head(decl);
            (last_identifier(head), non_empty(collapse_whitespace(decl)))
        }
        MacroKind::UEnum => {
            let name = ENUM_NAME
                .captures(window)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            let end = window.find(['{', ';']).unwrap_or(window.len());
            (name, non_empty(collapse_whitespace(&window[..end])))
        }
        MacroKind::UDelegate => {
            let end = window.find(';').unwrap_or(window.len());
            (None, non_empty(collapse_whitespace(&window[..end])))
        }
        // Filled in when the marker is attached to its class
        MacroKind::UClass | MacroKind::UStruct | MacroKind::UInterface => (None, None),
    }
}

/// Property declaration without initializer, array extent or bitfield width
fn property_head(decl: &str) -> &str {
    let bytes = decl.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'=' | b'{' | b'[' => return &decl[..i],
            b':' => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                if prev != Some(b':') && next != Some(b':') {
                    return &decl[..i];
                }
            }
            _ => {}
        }
    }
    decl
}

fn last_identifier(text: &str) -> Option<String> {
    IDENTIFIER
        .find_iter(text)
        .last()
        .map(|m| m.as_str().to_string())
}

// =============================================================================
// CLASSES
// =============================================================================

fn find_classes(path: &Path, code: &str, lines: &LineIndex) -> Vec<ClassSite> {
    let bytes = code.as_bytes();
    let mut sites = Vec::new();

    for caps in CLASS_PATTERN.captures_iter(code) {
        let (keyword, name, terminator) = match (caps.get(2), caps.get(4), caps.get(7)) {
            (Some(k), Some(n), Some(t)) => (k, n, t),
            _ => continue,
        };

        let is_template = caps.get(1).is_some();
        let is_forward = terminator.as_str() == ";";
        let (bases, interfaces) = caps
            .get(6)
            .filter(|_| !is_forward)
            .map(|m| parse_base_list(m.as_str()))
            .unwrap_or_default();

        let api_macro = caps.get(3).and_then(|m| {
            m.as_str()
                .split_whitespace()
                .rev()
                .find(|w| w.ends_with("_API"))
                .map(CompactString::from)
        });

        let (byte_end, body) = if is_forward {
            (terminator.end(), None)
        } else {
            let open = terminator.start();
            match find_matching(bytes, open, b'{', b'}') {
                Some(close) => (close + 1, Some((open + 1, close))),
                None => (code.len(), Some((open + 1, code.len()))),
            }
        };

        let kind = if keyword.as_str() == "struct" {
            ClassKind::Struct
        } else {
            ClassKind::Class
        };

        let name = CompactString::from(name.as_str());
        sites.push(ClassSite {
            symbol: ClassSymbol {
                qualified_name: name.clone(),
                name,
                kind,
                file: path.to_path_buf(),
                line_start: lines.line_of(keyword.start()),
                line_end: lines.line_of(byte_end.saturating_sub(1).max(keyword.start())),
                byte_start: keyword.start(),
                byte_end,
                bases,
                interfaces,
                annotations: Vec::new(),
                api_macro,
                is_forward,
                is_template,
            },
            body,
        });
    }

    sites
}

type NameList = SmallVec<[CompactString; 2]>;

/// Split `public UBase, public IInterface` into bases and interfaces
fn parse_base_list(list: &str) -> (NameList, NameList) {
    let mut bases = NameList::new();
    let mut interfaces = NameList::new();

    let mut depth = 0i32;
    let mut start = 0;
    let mut parts = Vec::new();
    for (i, c) in list.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    for part in parts {
        let without_args = part.split('<').next().unwrap_or(part);
        let name = without_args
            .split_whitespace()
            .filter(|w| !matches!(*w, "public" | "protected" | "private" | "virtual"))
            .last()
            .map(|w| w.trim_start_matches("::"));

        if let Some(name) = name.filter(|n| !n.is_empty()) {
            if is_interface_name(name) {
                interfaces.push(CompactString::from(name));
            } else {
                bases.push(CompactString::from(name));
            }
        }
    }

    (bases, interfaces)
}

/// Attach the nearest preceding type marker separated only by whitespace
fn attach_type_macros(code: &str, sites: &mut [ClassSite], macros: &[MacroSite]) {
    for site in sites.iter_mut() {
        let decl_start = site.symbol.byte_start;
        let marker = macros
            .iter()
            .filter(|m| m.annotation.kind.is_type_marker() && m.end <= decl_start)
            .last()
            .filter(|m| {
                let between = &code[m.end..decl_start];
                between.trim().is_empty() || between.trim_start().starts_with("template")
            });

        if let Some(marker) = marker {
            let mut annotation = marker.annotation.clone();
            annotation.member = Some(site.symbol.name.to_string());
            site.symbol.annotations.push(annotation);
        }
    }
}

/// Attach member macros to the innermost class whose body contains them
fn attach_member_macros(sites: &mut [ClassSite], macros: &[MacroSite]) {
    for m in macros.iter().filter(|m| m.annotation.kind.is_member_marker()) {
        let owner = sites
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.body.map(|(start, end)| (i, start, end)))
            .filter(|(_, start, end)| m.start >= *start && m.start < *end)
            .max_by_key(|(_, start, _)| *start)
            .map(|(i, _, _)| i);

        if let Some(i) = owner {
            sites[i].symbol.annotations.push(m.annotation.clone());
        }
    }
}

/// Prefix nested class names with their enclosing classes
fn qualify_nested(sites: &mut [ClassSite]) {
    let bodies: Vec<(usize, Option<(usize, usize)>, CompactString)> = sites
        .iter()
        .map(|s| (s.symbol.byte_start, s.body, s.symbol.name.clone()))
        .collect();

    for site in sites.iter_mut() {
        let start = site.symbol.byte_start;
        let mut outer: Vec<&(usize, Option<(usize, usize)>, CompactString)> = bodies
            .iter()
            .filter(|(_, body, _)| matches!(body, Some((s, e)) if start > *s && start < *e))
            .collect();
        if outer.is_empty() {
            continue;
        }
        outer.sort_by_key(|(s, _, _)| *s);

        let mut qualified = String::new();
        for (_, _, name) in outer {
            qualified.push_str(name);
            qualified.push_str("::");
        }
        qualified.push_str(&site.symbol.name);
        site.symbol.qualified_name = CompactString::from(qualified);
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Index of the delimiter closing the one at `open`, skipping literals
fn find_matching(bytes: &[u8], open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut literal: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(quote) = literal {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == quote || b == b'\n' {
                literal = None;
            }
        } else if b == b'"' || b == b'\'' {
            literal = Some(b);
        } else if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> ParsedFile {
        parse_source(&PathBuf::from("Test.h"), src).unwrap()
    }

    const HEALTH: &str = r#"#pragma once

#include "Components/ActorComponent.h"
#include "HealthComponent.generated.h"

/** Tracks hit points. */
UCLASS(ClassGroup=(Custom), meta=(BlueprintSpawnableComponent), Blueprintable)
class GAME_API UHealthComponent : public UActorComponent, public IDamageable
{
    GENERATED_BODY()

public:
    UPROPERTY(EditAnywhere, BlueprintReadWrite, Category = "Health")
    float MaxHealth = 100.f;

    UFUNCTION(BlueprintCallable, Category = "Health")
    void ApplyDamage(float Amount, AActor* Instigator);

    UFUNCTION(BlueprintImplementableEvent)
    void OnDeath();

    uint8 bDead : 1;
};
"#;

    #[test]
    fn test_class_with_bases_and_members() {
        let parsed = parse(HEALTH);
        assert_eq!(parsed.classes.len(), 1);

        let class = &parsed.classes[0];
        assert_eq!(class.name, "UHealthComponent");
        assert_eq!(class.kind, ClassKind::Class);
        assert_eq!(class.bases.as_slice(), &["UActorComponent"]);
        assert_eq!(class.interfaces.as_slice(), &["IDamageable"]);
        assert_eq!(class.api_macro.as_deref(), Some("GAME_API"));
        assert_eq!(class.line_start, 8);
        assert_eq!(class.line_end, 23);
        assert!(!class.is_forward);

        let marker = class.type_annotation().unwrap();
        assert_eq!(marker.kind, MacroKind::UClass);
        assert!(marker.flags.contains(ExposureFlags::BLUEPRINTABLE));
        assert_eq!(marker.member.as_deref(), Some("UHealthComponent"));

        let props: Vec<_> = class.properties().collect();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].member.as_deref(), Some("MaxHealth"));
        assert_eq!(props[0].category.as_deref(), Some("Health"));
        assert!(props[0].flags.contains(ExposureFlags::BLUEPRINT_READ_WRITE));
        assert!(props[0].flags.contains(ExposureFlags::EDIT_ANYWHERE));

        let funcs: Vec<_> = class.functions().collect();
        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs[0].member.as_deref(), Some("ApplyDamage"));
        assert_eq!(
            funcs[0].declaration.as_deref(),
            Some("void ApplyDamage(float Amount, AActor* Instigator)")
        );
        assert_eq!(funcs[1].member.as_deref(), Some("OnDeath"));
        assert!(funcs[1]
            .flags
            .contains(ExposureFlags::BLUEPRINT_IMPLEMENTABLE_EVENT));
    }

    #[test]
    fn test_all_macros_reported_in_order() {
        let parsed = parse(HEALTH);
        let kinds: Vec<MacroKind> = parsed.annotations.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MacroKind::UClass,
                MacroKind::UProperty,
                MacroKind::UFunction,
                MacroKind::UFunction
            ]
        );
        assert_eq!(parsed.annotations[0].member.as_deref(), Some("UHealthComponent"));
        assert_eq!(parsed.annotations[1].line, 13);
    }

    #[test]
    fn test_comment_lines() {
        let parsed = parse(HEALTH);
        assert!(parsed.comment_lines[5]); // line 6: doc comment
        assert!(!parsed.comment_lines[6]); // line 7: UCLASS
        assert!(!parsed.comment_lines[0]);
    }

    #[test]
    fn test_forward_declarations_and_templates() {
        let parsed = parse(
            "class UWorld;\nstruct FHitResult;\n\ntemplate <typename T>\nclass TPool : public TArray<T>\n{\n};\n",
        );
        assert_eq!(parsed.classes.len(), 3);

        assert!(parsed.classes[0].is_forward);
        assert!(parsed.classes[0].bases.is_empty());
        assert_eq!(parsed.classes[1].kind, ClassKind::Struct);
        assert!(parsed.classes[1].is_forward);

        let pool = &parsed.classes[2];
        assert!(pool.is_template);
        assert!(!pool.is_forward);
        assert_eq!(pool.bases.as_slice(), &["TArray"]);
        assert_eq!(pool.line_start, 5);
    }

    #[test]
    fn test_nested_classes_are_qualified() {
        let parsed = parse(
            "class FOuter\n{\npublic:\n    struct FInner\n    {\n        UPROPERTY()\n        int32 Value;\n    };\n    UPROPERTY()\n    int32 Count;\n};\n",
        );
        let inner = parsed.classes.iter().find(|c| c.name == "FInner").unwrap();
        assert_eq!(inner.qualified_name, "FOuter::FInner");
        assert_eq!(inner.properties().count(), 1);

        let outer = parsed.classes.iter().find(|c| c.name == "FOuter").unwrap();
        assert_eq!(outer.qualified_name, "FOuter");
        let props: Vec<_> = outer.properties().collect();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].member.as_deref(), Some("Count"));
    }

    #[test]
    fn test_final_and_struct_markers() {
        let parsed = parse(
            "USTRUCT(BlueprintType)\nstruct FAmmo final\n{\n    UPROPERTY(EditAnywhere)\n    TArray<int32> Clips[4];\n};\n",
        );
        let ammo = &parsed.classes[0];
        assert_eq!(ammo.name, "FAmmo");
        assert_eq!(ammo.kind, ClassKind::Struct);
        assert!(ammo
            .type_annotation()
            .unwrap()
            .flags
            .contains(ExposureFlags::BLUEPRINT_TYPE));
        assert_eq!(
            ammo.properties().next().unwrap().member.as_deref(),
            Some("Clips")
        );
    }

    #[test]
    fn test_enum_and_property_edge_cases() {
        let parsed = parse(
            "UENUM(BlueprintType)\nenum class EState : uint8 { Idle, Dead };\n\nclass A {\n    UPROPERTY()\n    uint8 bFlag : 1;\n    UPROPERTY()\n    EState::Type State = EState::Idle;\n};\n",
        );
        assert_eq!(parsed.annotations[0].kind, MacroKind::UEnum);
        assert_eq!(parsed.annotations[0].member.as_deref(), Some("EState"));

        let names: Vec<_> = parsed.classes[0]
            .properties()
            .map(|p| p.member.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["bFlag", "State"]);
    }

    #[test]
    fn test_commented_out_declarations_are_ignored() {
        let parsed = parse("// class UGhost : public UObject {};\n/* class UAlso {}; */\nclass UReal {};\n");
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].name, "UReal");
        assert!(parsed.comment_lines[0]);
        assert!(parsed.comment_lines[1]);
    }

    #[test]
    fn test_unbalanced_body_runs_to_end() {
        let parsed = parse("class UBroken : public UObject\n{\n    int X;\n");
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].line_end, 3);
    }

    #[test]
    fn test_parse_failures() {
        let path = PathBuf::from("Bad.h");
        assert_eq!(
            parse_bytes(&path, b"class A {};\0"),
            Err(ParseError::Binary)
        );
        assert_eq!(
            parse_bytes(&path, &[0xff, 0xfe, b'x']),
            Err(ParseError::InvalidUtf8)
        );
        assert_eq!(
            parse_bytes(&path, b"class A {};\n/* never closed\n"),
            Err(ParseError::UnterminatedComment { line: 2 })
        );
    }

    #[test]
    fn test_string_literals_hide_comment_markers() {
        let parsed = parse("const char* Url = \"http://example\";\nclass UAfter {};\n");
        assert_eq!(parsed.classes.len(), 1);
        assert!(!parsed.comment_lines[0]);
    }
}
