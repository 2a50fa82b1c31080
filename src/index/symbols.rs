//! Symbol table types
//!
//! Everything here is produced by the parser and owned by one index
//! generation. Symbols are never mutated after a generation is published.
//!
//! @module index/symbols

use bitflags::bitflags;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::path::PathBuf;

// =============================================================================
// MACRO KIND
// =============================================================================

/// UE reflection macro preceding a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacroKind {
    #[serde(rename = "UCLASS")]
    UClass,
    #[serde(rename = "USTRUCT")]
    UStruct,
    #[serde(rename = "UINTERFACE")]
    UInterface,
    #[serde(rename = "UENUM")]
    UEnum,
    #[serde(rename = "UPROPERTY")]
    UProperty,
    #[serde(rename = "UFUNCTION")]
    UFunction,
    #[serde(rename = "UDELEGATE")]
    UDelegate,
}

impl MacroKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "UCLASS" => Some(Self::UClass),
            "USTRUCT" => Some(Self::UStruct),
            "UINTERFACE" => Some(Self::UInterface),
            "UENUM" => Some(Self::UEnum),
            "UPROPERTY" => Some(Self::UProperty),
            "UFUNCTION" => Some(Self::UFunction),
            "UDELEGATE" => Some(Self::UDelegate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UClass => "UCLASS",
            Self::UStruct => "USTRUCT",
            Self::UInterface => "UINTERFACE",
            Self::UEnum => "UENUM",
            Self::UProperty => "UPROPERTY",
            Self::UFunction => "UFUNCTION",
            Self::UDelegate => "UDELEGATE",
        }
    }

    /// Marks a class/struct/interface declaration
    pub fn is_type_marker(&self) -> bool {
        matches!(self, Self::UClass | Self::UStruct | Self::UInterface)
    }

    /// Marks a member inside a class body
    pub fn is_member_marker(&self) -> bool {
        matches!(self, Self::UProperty | Self::UFunction)
    }
}

// =============================================================================
// EXPOSURE FLAGS
// =============================================================================

bitflags! {
    /// Specifiers that expose a declaration to Blueprints or the editor
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[repr(transparent)]
    pub struct ExposureFlags: u32 {
        const BLUEPRINT_CALLABLE = 1 << 0;
        const BLUEPRINT_PURE = 1 << 1;
        const BLUEPRINT_IMPLEMENTABLE_EVENT = 1 << 2;
        const BLUEPRINT_NATIVE_EVENT = 1 << 3;
        const BLUEPRINT_READ_ONLY = 1 << 4;
        const BLUEPRINT_READ_WRITE = 1 << 5;
        const BLUEPRINT_ASSIGNABLE = 1 << 6;
        const BLUEPRINT_AUTHORITY_ONLY = 1 << 7;
        const BLUEPRINTABLE = 1 << 8;
        const BLUEPRINT_TYPE = 1 << 9;
        const EDIT_ANYWHERE = 1 << 10;
        const EDIT_DEFAULTS_ONLY = 1 << 11;
        const EDIT_INSTANCE_ONLY = 1 << 12;
        const VISIBLE_ANYWHERE = 1 << 13;
        const VISIBLE_DEFAULTS_ONLY = 1 << 14;
        const VISIBLE_INSTANCE_ONLY = 1 << 15;
        const REPLICATED = 1 << 16;
        const EXEC = 1 << 17;
        const ABSTRACT = 1 << 18;
    }
}

const SPECIFIERS: &[(&str, ExposureFlags)] = &[
    ("blueprintcallable", ExposureFlags::BLUEPRINT_CALLABLE),
    ("blueprintpure", ExposureFlags::BLUEPRINT_PURE),
    ("blueprintimplementableevent", ExposureFlags::BLUEPRINT_IMPLEMENTABLE_EVENT),
    ("blueprintnativeevent", ExposureFlags::BLUEPRINT_NATIVE_EVENT),
    ("blueprintreadonly", ExposureFlags::BLUEPRINT_READ_ONLY),
    ("blueprintreadwrite", ExposureFlags::BLUEPRINT_READ_WRITE),
    ("blueprintassignable", ExposureFlags::BLUEPRINT_ASSIGNABLE),
    ("blueprintauthorityonly", ExposureFlags::BLUEPRINT_AUTHORITY_ONLY),
    ("blueprintable", ExposureFlags::BLUEPRINTABLE),
    ("blueprinttype", ExposureFlags::BLUEPRINT_TYPE),
    ("editanywhere", ExposureFlags::EDIT_ANYWHERE),
    ("editdefaultsonly", ExposureFlags::EDIT_DEFAULTS_ONLY),
    ("editinstanceonly", ExposureFlags::EDIT_INSTANCE_ONLY),
    ("visibleanywhere", ExposureFlags::VISIBLE_ANYWHERE),
    ("visibledefaultsonly", ExposureFlags::VISIBLE_DEFAULTS_ONLY),
    ("visibleinstanceonly", ExposureFlags::VISIBLE_INSTANCE_ONLY),
    ("replicated", ExposureFlags::REPLICATED),
    ("replicatedusing", ExposureFlags::REPLICATED),
    ("exec", ExposureFlags::EXEC),
    ("abstract", ExposureFlags::ABSTRACT),
];

impl ExposureFlags {
    /// Everything that makes a declaration reachable from Blueprint graphs
    pub const BLUEPRINT_VISIBLE: Self = Self::BLUEPRINT_CALLABLE
        .union(Self::BLUEPRINT_PURE)
        .union(Self::BLUEPRINT_IMPLEMENTABLE_EVENT)
        .union(Self::BLUEPRINT_NATIVE_EVENT)
        .union(Self::BLUEPRINT_READ_ONLY)
        .union(Self::BLUEPRINT_READ_WRITE)
        .union(Self::BLUEPRINT_ASSIGNABLE)
        .union(Self::BLUEPRINTABLE)
        .union(Self::BLUEPRINT_TYPE);

    /// Collect flags from one specifier name (case-insensitive)
    pub fn from_specifier(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        SPECIFIERS
            .iter()
            .find(|(spec, _)| *spec == name)
            .map(|(_, flag)| *flag)
            .unwrap_or_else(Self::empty)
    }

    pub fn is_blueprint_exposed(&self) -> bool {
        self.intersects(Self::BLUEPRINT_VISIBLE)
    }
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// One UE macro occurrence with the declaration it decorates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureAnnotation {
    pub kind: MacroKind,
    /// Raw attribute text between the macro's parentheses
    pub raw: String,
    /// Declared member, class or enum name when it could be recovered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    /// Declaration following the macro, whitespace-collapsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
    /// `Category = ...` specifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub line: u32,
    pub flags: ExposureFlags,
}

impl ExposureAnnotation {
    pub fn is_blueprint_exposed(&self) -> bool {
        self.flags.is_blueprint_exposed()
    }
}

// =============================================================================
// CLASS SYMBOL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Struct,
}

/// A class or struct declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSymbol {
    pub name: CompactString,
    /// `Outer::Inner` for nested declarations
    pub qualified_name: CompactString,
    pub kind: ClassKind,
    pub file: PathBuf,
    /// Line of the `class`/`struct` keyword (1-indexed)
    pub line_start: u32,
    pub line_end: u32,
    pub byte_start: usize,
    pub byte_end: usize,
    pub bases: SmallVec<[CompactString; 2]>,
    pub interfaces: SmallVec<[CompactString; 2]>,
    /// Class marker first, then member annotations in source order
    pub annotations: Vec<ExposureAnnotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_macro: Option<CompactString>,
    pub is_forward: bool,
    pub is_template: bool,
}

impl ClassSymbol {
    /// The `UCLASS`/`USTRUCT`/`UINTERFACE` marker, if any
    pub fn type_annotation(&self) -> Option<&ExposureAnnotation> {
        self.annotations.iter().find(|a| a.kind.is_type_marker())
    }

    pub fn properties(&self) -> impl Iterator<Item = &ExposureAnnotation> {
        self.annotations
            .iter()
            .filter(|a| a.kind == MacroKind::UProperty)
    }

    pub fn functions(&self) -> impl Iterator<Item = &ExposureAnnotation> {
        self.annotations
            .iter()
            .filter(|a| a.kind == MacroKind::UFunction)
    }

    /// Bases followed by interfaces, in declaration order
    pub fn parents(&self) -> impl Iterator<Item = &CompactString> {
        self.bases.iter().chain(self.interfaces.iter())
    }

    pub fn contains_line(&self, line: u32) -> bool {
        !self.is_forward && line >= self.line_start && line <= self.line_end
    }
}

/// Whether a base name follows the `IFoo` interface convention
pub fn is_interface_name(name: &str) -> bool {
    let last = name.rsplit("::").next().unwrap_or(name);
    let mut chars = last.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('I'), Some(c)) if c.is_ascii_uppercase()
    )
}

/// Strip the UE type prefix (`U`, `A`, `F`, `I`, `T`, `E`, `S`) from a class name
pub fn strip_type_prefix(name: &str) -> &str {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(p), Some(c)) if "UAFITES".contains(p) && c.is_ascii_uppercase() => &name[1..],
        _ => name,
    }
}
