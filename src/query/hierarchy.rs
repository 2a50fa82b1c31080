//! Inheritance hierarchy resolution
//!
//! Walks from a class up to its root ancestors inside one index view.
//! Cycles are cut at the first repeated class and reported as a broken
//! hierarchy.

use serde::Serialize;
use std::path::PathBuf;

use super::results::Lookup;
use crate::index::{ExposureAnnotation, IndexView};

/// Upper bound on ancestor depth, independent of cycle detection
const MAX_HIERARCHY_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Declared in the scope's index
    Indexed,
    /// Named as a base but not declared in the scope's index
    External,
    /// Repeats a class already on the path; not expanded
    Cycle,
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyNode {
    pub name: String,
    pub status: NodeStatus,
    pub is_interface: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub annotations: Vec<ExposureAnnotation>,
    pub parents: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassHierarchy {
    pub root: HierarchyNode,
    /// The class followed by its primary bases
    pub chain: Vec<String>,
    /// A cycle was found
    pub broken: bool,
    /// Longest ancestor path below the root
    pub depth: usize,
}

/// Resolve the hierarchy of `name`
pub fn hierarchy(view: &IndexView, name: &str, include_interfaces: bool) -> Lookup<ClassHierarchy> {
    let symbol = match view.find_class(name) {
        Some(symbol) => symbol,
        None => return Lookup::not_found(name.trim()),
    };

    let mut walker = Walker {
        view,
        include_interfaces,
        stack: Vec::new(),
        broken: false,
    };
    let root = walker.node(&symbol.qualified_name, false, 0);
    let depth = depth_of(&root);

    Lookup::Found(ClassHierarchy {
        chain: primary_chain(view, &symbol.qualified_name),
        broken: walker.broken,
        depth,
        root,
    })
}

struct Walker<'a> {
    view: &'a IndexView,
    include_interfaces: bool,
    stack: Vec<String>,
    broken: bool,
}

impl Walker<'_> {
    fn node(&mut self, name: &str, is_interface: bool, depth: usize) -> HierarchyNode {
        let symbol = match self.view.find_class(name) {
            Some(symbol) => symbol,
            None => {
                return HierarchyNode {
                    name: name.to_string(),
                    status: NodeStatus::External,
                    is_interface,
                    file: None,
                    line: None,
                    annotations: Vec::new(),
                    parents: Vec::new(),
                }
            }
        };

        let key = symbol.qualified_name.to_string();
        let mut node = HierarchyNode {
            name: key.clone(),
            status: NodeStatus::Indexed,
            is_interface,
            file: Some(symbol.file.clone()),
            line: Some(symbol.line_start),
            annotations: symbol.annotations.clone(),
            parents: Vec::new(),
        };

        if self.stack.contains(&key) || depth >= MAX_HIERARCHY_DEPTH {
            self.broken = true;
            node.status = NodeStatus::Cycle;
            node.annotations.clear();
            return node;
        }

        self.stack.push(key);
        for base in &symbol.bases {
            let parent = self.node(base, false, depth + 1);
            node.parents.push(parent);
        }
        if self.include_interfaces {
            for interface in &symbol.interfaces {
                let parent = self.node(interface, true, depth + 1);
                node.parents.push(parent);
            }
        }
        self.stack.pop();
        node
    }
}

fn depth_of(node: &HierarchyNode) -> usize {
    node.parents
        .iter()
        .map(|p| 1 + depth_of(p))
        .max()
        .unwrap_or(0)
}

/// Follow first bases until a root, an unindexed class or a repeat
fn primary_chain(view: &IndexView, start: &str) -> Vec<String> {
    let mut chain = vec![start.to_string()];
    let mut current = view.find_class(start);

    while let Some(symbol) = current {
        let next = match symbol.bases.first() {
            Some(next) => next,
            None => break,
        };
        let resolved = view.find_class(next);
        let name = resolved
            .map(|s| s.qualified_name.to_string())
            .unwrap_or_else(|| next.to_string());

        if chain.contains(&name) || chain.len() > MAX_HIERARCHY_DEPTH {
            break;
        }
        chain.push(name);
        current = resolved;
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IndexConfig;
    use crate::index::IndexStore;
    use tempfile::TempDir;

    fn view_of(source: &str) -> (TempDir, IndexView) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Classes.h"), source).unwrap();
        let store = IndexStore::new(&IndexConfig::default()).unwrap();
        let view = store.ensure(&[temp.path().to_path_buf()]).unwrap();
        (temp, view)
    }

    #[test]
    fn test_hierarchy_up_to_external_root() {
        let (_temp, view) = view_of(
            "UCLASS()\nclass UActorComponent : public UObject, public IInterface_AssetUserData {};\n\
             UCLASS(Blueprintable)\nclass UHealthComponent : public UActorComponent, public IDamageable {};\n",
        );

        let result = hierarchy(&view, "UHealthComponent", true);
        let found = result.found().unwrap();
        assert!(!found.broken);
        assert_eq!(found.chain, vec!["UHealthComponent", "UActorComponent", "UObject"]);
        assert_eq!(found.depth, 2);

        let root = &found.root;
        assert_eq!(root.status, NodeStatus::Indexed);
        assert_eq!(root.annotations.len(), 1);
        assert_eq!(root.parents.len(), 2);
        assert_eq!(root.parents[0].name, "UActorComponent");
        assert_eq!(root.parents[1].name, "IDamageable");
        assert!(root.parents[1].is_interface);
        assert_eq!(root.parents[1].status, NodeStatus::External);

        let object = &root.parents[0].parents[0];
        assert_eq!(object.name, "UObject");
        assert_eq!(object.status, NodeStatus::External);
    }

    #[test]
    fn test_interfaces_omitted_on_request() {
        let (_temp, view) = view_of("class A : public B, public IThing {};\n");
        let found = hierarchy(&view, "A", false).into_found().unwrap();
        assert_eq!(found.root.parents.len(), 1);
        assert_eq!(found.root.parents[0].name, "B");
    }

    #[test]
    fn test_self_reference_is_broken() {
        let (_temp, view) = view_of("class ALoop : public ALoop {};\n");
        let found = hierarchy(&view, "ALoop", true).into_found().unwrap();
        assert!(found.broken);
        assert_eq!(found.root.parents[0].status, NodeStatus::Cycle);
        assert_eq!(found.chain, vec!["ALoop"]);
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let (_temp, view) = view_of("class A : public B {};\nclass B : public C {};\nclass C : public A {};\n");
        let found = hierarchy(&view, "A", true).into_found().unwrap();
        assert!(found.broken);
        assert_eq!(found.chain, vec!["A", "B", "C"]);
        assert_eq!(found.depth, 3);
    }

    #[test]
    fn test_unknown_class_is_not_found() {
        let (_temp, view) = view_of("class A {};\n");
        assert!(!hierarchy(&view, "UMissing", true).is_found());
    }
}
