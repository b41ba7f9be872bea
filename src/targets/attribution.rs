use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::target_path::TargetPath;

/// Which entry module pulled in which dependency.
///
/// A directed graph with one edge `source -> dependency` per attribution, plus a path index
/// for O(1) node lookup. Edges are direct facts, never transitive closures: `uses(a, c)`
/// holds only if `c` was discovered while resolving `a`.
#[derive(Debug, Default)]
pub struct AttributionGraph {
    graph: DiGraph<TargetPath, ()>,
    index: HashMap<TargetPath, NodeIndex>,
}

impl AttributionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependency` was discovered through `source`. Idempotent.
    pub fn record(&mut self, source: &TargetPath, dependency: &TargetPath) {
        let from = self.node(source);
        let to = self.node(dependency);
        self.graph.update_edge(from, to, ());
    }

    pub fn uses(&self, source: &TargetPath, dependency: &TargetPath) -> bool {
        match (self.index.get(source), self.index.get(dependency)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Dependencies attributed to `source`, in the order they were recorded.
    pub fn dependencies_of(&self, source: &TargetPath) -> Vec<TargetPath> {
        self.neighbors(source, Direction::Outgoing)
    }

    /// Sources that `dependency` was attributed to, in the order they were recorded.
    pub fn dependants_of(&self, dependency: &TargetPath) -> Vec<TargetPath> {
        self.neighbors(dependency, Direction::Incoming)
    }

    /// Number of recorded `source -> dependency` pairs.
    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    fn node(&mut self, path: &TargetPath) -> NodeIndex {
        if let Some(&existing) = self.index.get(path) {
            return existing;
        }
        let idx = self.graph.add_node(path.clone());
        self.index.insert(path.clone(), idx);
        idx
    }

    fn neighbors(&self, path: &TargetPath, dir: Direction) -> Vec<TargetPath> {
        let Some(&idx) = self.index.get(path) else {
            return Vec::new();
        };
        // petgraph walks adjacency lists newest edge first.
        let mut found: Vec<TargetPath> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].clone())
            .collect();
        found.reverse();
        found
    }
}
