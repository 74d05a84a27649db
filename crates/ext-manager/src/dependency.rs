//! Dependency graph and load ordering for extensions.
//!
//! The graph holds the full static topology of every discovered extension:
//! edges point from dependent to dependency, so if A depends on B the edge
//! is `A -> B`. Ordering only considers a candidate subset (normally the
//! enabled extensions) and returns dependencies before dependents.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use ext_manager::dependency::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("editor-core", Vec::<String>::new());
//! graph.add_node("git-blame", vec!["editor-core".to_string()]);
//!
//! let candidates: BTreeSet<String> = ["git-blame", "editor-core"]
//!     .into_iter()
//!     .map(String::from)
//!     .collect();
//! let order = graph.order_for_load(&candidates).unwrap();
//! assert_eq!(order, vec!["editor-core", "git-blame"]);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::discovery::DiscoveredSet;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the current DFS path.
    Gray,
    /// Finished; already emitted.
    Black,
}

/// Directed dependency graph keyed by extension id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Adjacency list: key depends on each value, in manifest order.
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for every discovered extension, enabled or not.
    pub fn from_discovered(discovered: &DiscoveredSet) -> Self {
        let mut graph = Self::new();
        for (id, manifest) in discovered {
            graph.add_node(id.clone(), manifest.dependencies().to_vec());
        }
        graph
    }

    /// Add or replace a node together with its outgoing edges.
    pub fn add_node(&mut self, id: impl Into<String>, dependencies: Vec<String>) {
        self.edges.insert(id.into(), dependencies);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Direct dependencies of `id`; empty for unknown ids.
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Ids that directly depend on `id`, sorted.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, deps)| deps.iter().any(|dep| dep == id))
            .map(|(from, _)| from.as_str())
            .collect()
    }

    /// Compute a load order for `candidates`.
    ///
    /// Only edges whose target is itself a candidate are followed; a
    /// dependency outside the set is treated as satisfied. Uses a three-color
    /// depth-first search and emits nodes in post-order, so every dependency
    /// precedes its dependents. The result is deterministic: candidates are
    /// visited in sorted order and dependencies in manifest order.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyCycle` if the induced subgraph has a cycle.
    /// No partial order is produced in that case.
    pub fn order_for_load(&self, candidates: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut colors: HashMap<&str, Color> = HashMap::with_capacity(candidates.len());
        let mut path: Vec<&str> = Vec::new();
        let mut order = Vec::with_capacity(candidates.len());

        for id in candidates {
            if color_of(&colors, id) == Color::White {
                self.visit(id, candidates, &mut colors, &mut path, &mut order)?;
            }
        }

        tracing::debug!(?order, "computed extension load order");
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        candidates: &BTreeSet<String>,
        colors: &mut HashMap<&'a str, Color>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        colors.insert(id, Color::Gray);
        path.push(id);

        for dep in self.dependencies_of(id) {
            if !candidates.contains(dep) {
                continue;
            }
            match color_of(colors, dep) {
                Color::Gray => {
                    // Back-edge: the cycle is the path from `dep` to here.
                    let start = path.iter().position(|p| *p == dep.as_str()).unwrap_or(0);
                    let mut participants: Vec<String> =
                        path[start..].iter().map(|p| p.to_string()).collect();
                    participants.push(dep.clone());
                    return Err(Error::DependencyCycle { participants });
                }
                Color::Black => {}
                Color::White => self.visit(dep, candidates, colors, path, order)?,
            }
        }

        path.pop();
        colors.insert(id, Color::Black);
        order.push(id.to_string());
        Ok(())
    }
}

fn color_of(colors: &HashMap<&str, Color>, id: &str) -> Color {
    colors.get(id).copied().unwrap_or(Color::White)
}
