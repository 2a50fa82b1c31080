//! Live service request and payload types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::domain::Domain;

/// Operations exposed by the live introspection service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOperation {
    BlueprintSearch,
    BlueprintHierarchy,
    BlueprintDependencies,
    BlueprintReferencers,
    BlueprintGraph,
    BlueprintDetails,
    AssetSearch,
    AssetReferences,
    AssetReferencers,
    AssetMetadata,
}

impl ServiceOperation {
    pub fn domain(&self) -> Domain {
        match self {
            Self::BlueprintSearch
            | Self::BlueprintHierarchy
            | Self::BlueprintDependencies
            | Self::BlueprintReferencers
            | Self::BlueprintGraph
            | Self::BlueprintDetails => Domain::Blueprint,
            Self::AssetSearch
            | Self::AssetReferences
            | Self::AssetReferencers
            | Self::AssetMetadata => Domain::Asset,
        }
    }

    /// Route relative to the service base URL
    pub fn route(&self) -> &'static str {
        match self {
            Self::BlueprintSearch => "blueprint/search",
            Self::BlueprintHierarchy => "blueprint/hierarchy",
            Self::BlueprintDependencies => "blueprint/dependencies",
            Self::BlueprintReferencers => "blueprint/referencers",
            Self::BlueprintGraph => "blueprint/graph",
            Self::BlueprintDetails => "blueprint/details",
            Self::AssetSearch => "asset/search",
            Self::AssetReferences => "asset/references",
            Self::AssetReferencers => "asset/referencers",
            Self::AssetMetadata => "asset/metadata",
        }
    }

    /// Operation name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlueprintSearch | Self::AssetSearch => "search",
            Self::BlueprintHierarchy => "hierarchy",
            Self::BlueprintDependencies => "dependencies",
            Self::BlueprintReferencers | Self::AssetReferencers => "referencers",
            Self::BlueprintGraph => "graph",
            Self::BlueprintDetails => "details",
            Self::AssetReferences => "references",
            Self::AssetMetadata => "metadata",
        }
    }

    /// Query parameter naming the target object, for per-object operations
    pub fn path_param(&self) -> Option<&'static str> {
        match self.domain() {
            _ if matches!(self, Self::BlueprintSearch | Self::AssetSearch) => None,
            Domain::Blueprint => Some("bp_path"),
            _ => Some("asset_path"),
        }
    }
}

/// One service call: operation plus flat query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRequest {
    pub operation: ServiceOperation,
    pub params: Vec<(String, String)>,
}

impl ServiceRequest {
    pub fn new(operation: ServiceOperation) -> Self {
        Self {
            operation,
            params: Vec::new(),
        }
    }

    /// Per-object request, e.g. `blueprint/dependencies?bp_path=...`
    pub fn for_path(operation: ServiceOperation, path: &str) -> Self {
        let request = Self::new(operation);
        match operation.path_param() {
            Some(key) => request.param(key, path),
            None => request,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// Add a parameter only when a non-empty value is given
    pub fn optional(self, key: &str, value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.param(key, v),
            _ => self,
        }
    }

    pub fn domain(&self) -> Domain {
        self.operation.domain()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A Blueprint or asset reference as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AssetRef {
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,
}

const PATH_KEYS: [&str; 4] = ["path", "asset_path", "object_path", "package_name"];
const NAME_KEYS: [&str; 2] = ["name", "asset_name"];
const CLASS_KEYS: [&str; 3] = ["class", "class_name", "asset_class"];
const PARENT_KEYS: [&str; 2] = ["parent_class", "parent"];

/// First non-empty string under any of `keys`, in key order
fn first_string(entry: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

impl AssetRef {
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: name_from_path(&path).to_string(),
            path,
            class: None,
            parent_class: None,
        }
    }

    /// Entries arrive either as bare object paths or as objects whose
    /// fields may appear under several names at once
    fn from_value(value: &Value) -> Option<Self> {
        let asset = match value {
            Value::String(path) => Self::from_path(path.trim()),
            Value::Object(entry) => {
                let name = first_string(entry, &NAME_KEYS);
                let path = first_string(entry, &PATH_KEYS).or_else(|| name.clone())?;
                Self {
                    name: name.unwrap_or_else(|| name_from_path(&path).to_string()),
                    path,
                    class: first_string(entry, &CLASS_KEYS),
                    parent_class: first_string(entry, &PARENT_KEYS),
                }
            }
            _ => return None,
        };
        (!asset.path.is_empty()).then_some(asset)
    }

    /// Native class package (`/Script/Module.Class`)
    pub fn is_native(&self) -> bool {
        self.path.starts_with("/Script/")
    }

    /// Engine content (`/Engine/...`)
    pub fn is_engine_content(&self) -> bool {
        self.path.starts_with("/Engine/")
    }

    /// Whether the entry is a Blueprint rather than a plain asset
    pub fn looks_like_blueprint(&self) -> bool {
        match &self.class {
            Some(class) => class.contains("Blueprint"),
            None => ["BP_", "WBP_", "ABP_", "B_"]
                .iter()
                .any(|prefix| self.name.starts_with(prefix)),
        }
    }

    /// `HealthComponent` from `/Script/Game.HealthComponent`
    pub fn parent_class_name(&self) -> Option<&str> {
        self.parent_class
            .as_deref()
            .map(|p| p.rsplit(['.', '/']).next().unwrap_or(p))
            .filter(|p| !p.is_empty())
    }
}

/// `BP_Hero` from `/Game/Heroes/BP_Hero.BP_Hero`
pub fn name_from_path(path: &str) -> &str {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.split('.').next().unwrap_or(last)
}

/// Normalize a list payload under the first present key
pub fn extract_refs(payload: &Value, keys: &[&str]) -> Vec<AssetRef> {
    let list = keys
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array))
        .or_else(|| payload.as_array());

    list.map(|items| items.iter().filter_map(AssetRef::from_value).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_routes() {
        assert_eq!(ServiceOperation::BlueprintDependencies.route(), "blueprint/dependencies");
        assert_eq!(ServiceOperation::AssetReferences.domain(), Domain::Asset);
        assert_eq!(ServiceOperation::BlueprintSearch.path_param(), None);
        assert_eq!(ServiceOperation::BlueprintGraph.path_param(), Some("bp_path"));
        assert_eq!(ServiceOperation::AssetMetadata.path_param(), Some("asset_path"));
    }

    #[test]
    fn test_request_builder() {
        let request = ServiceRequest::new(ServiceOperation::BlueprintSearch)
            .param("pattern", "*Hero*")
            .optional("class", Some("  "))
            .optional("type", None);
        assert_eq!(request.params.len(), 1);
        assert_eq!(request.get("pattern"), Some("*Hero*"));

        let request = ServiceRequest::for_path(ServiceOperation::AssetReferencers, "/Game/M");
        assert_eq!(request.get("asset_path"), Some("/Game/M"));
    }

    #[test]
    fn test_extract_mixed_entries() {
        let payload = json!({
            "ok": true,
            "dependencies": [
                "/Game/Meshes/SM_Rock.SM_Rock",
                {"path": "/Game/BP/BP_Hero.BP_Hero", "class": "Blueprint", "parent_class": "/Script/Game.HeroCharacter"},
                {"asset_path": "/Game/UI/WBP_Hud", "asset_class": "WidgetBlueprint"},
                {"class": "Orphan"},
                42
            ]
        });

        let refs = extract_refs(&payload, &["dependencies", "references"]);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].name, "SM_Rock");
        assert!(!refs[0].looks_like_blueprint());
        assert_eq!(refs[1].parent_class_name(), Some("HeroCharacter"));
        assert!(refs[1].looks_like_blueprint());
        assert_eq!(refs[2].name, "WBP_Hud");
        assert!(refs[2].looks_like_blueprint());
    }

    #[test]
    fn test_entries_with_overlapping_keys() {
        let payload = json!({"matches": [
            {"path": "/Game/BP_Hero.BP_Hero", "package_name": "/Game/BP_Hero", "class": "Blueprint"},
            {"path": "/Game/BP_Door.BP_Door", "class": "Blueprint", "asset_class": "Blueprint"},
            {"package_name": "/Game/M_Skin", "class_name": "", "asset_class": "Material"}
        ]});

        let refs = extract_refs(&payload, &["matches"]);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].path, "/Game/BP_Hero.BP_Hero");
        assert_eq!(refs[1].name, "BP_Door");
        assert_eq!(refs[1].class.as_deref(), Some("Blueprint"));
        assert_eq!(refs[2].path, "/Game/M_Skin");
        assert_eq!(refs[2].class.as_deref(), Some("Material"));
    }

    #[test]
    fn test_extract_falls_back_to_next_key() {
        let payload = json!({"references": [{"path": "/Game/A"}]});
        let refs = extract_refs(&payload, &["dependencies", "references"]);
        assert_eq!(refs, vec![AssetRef::from_path("/Game/A")]);
        assert!(extract_refs(&json!({"other": 1}), &["matches"]).is_empty());
    }

    #[test]
    fn test_path_classification() {
        assert!(AssetRef::from_path("/Script/Engine.Actor").is_native());
        assert!(AssetRef::from_path("/Engine/Basic/Cube").is_engine_content());
        assert!(AssetRef::from_path("/Game/BP_Door").looks_like_blueprint());
        assert!(!AssetRef::from_path("/Game/T_Door").looks_like_blueprint());
    }
}
