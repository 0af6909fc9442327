//! Bi-directional dependency graph: `imports[file] -> files` and
//! `imported_by[file] -> files`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepsGraph {
    imports: BTreeMap<String, Vec<String>>,
    imported_by: BTreeMap<String, Vec<String>>,
}

impl DepsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the entire graph from a full map of `path -> dependencies`.
    /// Dependents are derived globally, so this always operates on the
    /// complete snapshot rather than a single file.
    pub fn rebuild(dependencies: &BTreeMap<String, Vec<String>>) -> Self {
        let mut imported_by: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (file, deps) in dependencies {
            for dep in deps {
                imported_by.entry(dep.clone()).or_default().push(file.clone());
            }
        }
        for dependents in imported_by.values_mut() {
            dependents.sort();
            dependents.dedup();
        }
        Self {
            imports: dependencies.clone(),
            imported_by,
        }
    }

    pub fn imports_of(&self, file: &str) -> &[String] {
        self.imports.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn imported_by(&self, file: &str) -> &[String] {
        self.imported_by.get(file).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_derives_inverse_edges() {
        let mut deps = BTreeMap::new();
        deps.insert("a.ts".to_string(), vec!["b.ts".to_string(), "c.ts".to_string()]);
        deps.insert("b.ts".to_string(), vec!["c.ts".to_string()]);
        deps.insert("c.ts".to_string(), vec![]);

        let graph = DepsGraph::rebuild(&deps);
        assert_eq!(graph.imports_of("a.ts"), &["b.ts".to_string(), "c.ts".to_string()]);
        assert_eq!(graph.imported_by("c.ts"), &["a.ts".to_string(), "b.ts".to_string()]);
        assert!(graph.imported_by("a.ts").is_empty());
    }
}
