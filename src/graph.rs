//! Dependency graph data structures and impact propagation.
//!
//! A [`DependencyGraph`] maps project-relative file paths (forward slashes)
//! to the files they import and, mirrored, to the files importing them.
//! [`affected_files`] walks the reverse edges from a set of changed files.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraph {
    /// file -> files it imports
    pub imports: BTreeMap<String, BTreeSet<String>>,
    /// file -> files importing it; always the exact mirror of `imports`
    pub imported_by: BTreeMap<String, BTreeSet<String>>,
    /// file -> exported symbol names (informational)
    pub exports: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `from -> to` and its mirror. Self-imports are ignored.
    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let inserted = self
            .imports
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        if inserted {
            self.imported_by
                .entry(to.to_string())
                .or_default()
                .insert(from.to_string());
        }
        inserted
    }

    pub fn set_exports(&mut self, file: &str, names: impl IntoIterator<Item = String>) {
        let names: BTreeSet<String> = names.into_iter().collect();
        if names.is_empty() {
            self.exports.remove(file);
        } else {
            self.exports.insert(file.to_string(), names);
        }
    }

    /// Files imported by `file`. Empty when unknown.
    pub fn imports_of(&self, file: &str) -> impl Iterator<Item = &str> {
        self.imports.get(file).into_iter().flatten().map(String::as_str)
    }

    /// Files importing `file`. Empty when unknown.
    pub fn importers_of(&self, file: &str) -> impl Iterator<Item = &str> {
        self.imported_by.get(file).into_iter().flatten().map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.imports.values().map(BTreeSet::len).sum()
    }

    /// `b ∈ imports[a]  <=>  a ∈ imported_by[b]` for every pair.
    pub fn is_symmetric(&self) -> bool {
        let forward = self
            .imports
            .iter()
            .all(|(a, targets)| targets.iter().all(|b| self.importers_of(b).any(|x| x == a)));
        let backward = self
            .imported_by
            .iter()
            .all(|(b, sources)| sources.iter().all(|a| self.imports_of(a).any(|x| x == b)));
        forward && backward
    }
}

/// Breadth-first walk over `imported_by` from every changed file.
///
/// Returns each reachable file with the shortest distance (in import hops)
/// to any changed file; changed files themselves are at depth 0. Files at
/// `max_depth` are recorded but not expanded.
pub fn affected_files<S: AsRef<str>>(
    changed: &[S],
    graph: &DependencyGraph,
    max_depth: usize,
) -> BTreeMap<String, usize> {
    let mut best: HashMap<&str, usize> = HashMap::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    for path in changed {
        let path = path.as_ref();
        if best.insert(path, 0).is_none() {
            queue.push_back((path, 0));
        }
    }

    while let Some((file, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let next = depth + 1;
        for importer in graph.importers_of(file) {
            match best.get(importer) {
                Some(&known) if known <= next => {}
                _ => {
                    best.insert(importer, next);
                    queue.push_back((importer, next));
                }
            }
        }
    }

    best.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for (from, to) in edges {
            g.add_edge(from, to);
        }
        g
    }

    #[test]
    fn add_edge_deduplicates_and_mirrors() {
        let mut g = DependencyGraph::new();
        assert!(g.add_edge("b.ts", "a.ts"));
        assert!(!g.add_edge("b.ts", "a.ts"));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.importers_of("a.ts").collect::<Vec<_>>(), vec!["b.ts"]);
        assert!(g.is_symmetric());
    }

    #[test]
    fn self_import_is_ignored() {
        let mut g = DependencyGraph::new();
        assert!(!g.add_edge("a.ts", "a.ts"));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn direct_importer_is_depth_one() {
        // b imports a
        let g = chain(&[("b", "a")]);
        let affected = affected_files(&["a"], &g, DEFAULT_MAX_DEPTH);
        assert_eq!(affected.len(), 2);
        assert_eq!(affected["a"], 0);
        assert_eq!(affected["b"], 1);
    }

    #[test]
    fn max_depth_bounds_traversal() {
        // d -> c -> b -> a
        let g = chain(&[("b", "a"), ("c", "b"), ("d", "c")]);
        let affected = affected_files(&["a"], &g, 2);
        assert_eq!(affected.get("c"), Some(&2));
        assert!(!affected.contains_key("d"));
    }

    #[test]
    fn mutual_cycle_terminates() {
        let g = chain(&[("a", "b"), ("b", "a")]);
        let affected = affected_files(&["a"], &g, DEFAULT_MAX_DEPTH);
        assert_eq!(affected.len(), 2);
        assert_eq!(affected["a"], 0);
        assert_eq!(affected["b"], 1);
    }

    #[test]
    fn shortest_depth_wins_across_seeds() {
        // t imports x imports a; t also imports b directly
        let g = chain(&[("x", "a"), ("t", "x"), ("t", "b")]);
        let affected = affected_files(&["a", "b"], &g, DEFAULT_MAX_DEPTH);
        assert_eq!(affected["t"], 1);
        assert_eq!(affected["x"], 1);
    }

    #[test]
    fn unknown_changed_file_is_still_reported() {
        let g = DependencyGraph::new();
        let affected = affected_files(&["ghost.ts"], &g, DEFAULT_MAX_DEPTH);
        assert_eq!(affected.len(), 1);
        assert_eq!(affected["ghost.ts"], 0);
    }

    #[test]
    fn empty_exports_are_not_stored() {
        let mut g = DependencyGraph::new();
        g.set_exports("a.ts", Vec::new());
        assert!(g.exports.is_empty());
        g.set_exports("a.ts", vec!["foo".to_string()]);
        assert_eq!(g.exports["a.ts"].len(), 1);
    }
}
