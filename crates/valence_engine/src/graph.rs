//! Dependency graph between build targets.
//!
//! Nodes are target ids. An edge `producer -> consumer` exists for every file
//! the consumer reads that the producer writes. The graph orders builds and
//! tells the project which stamps to wire into which consumers; it never
//! triggers a rebuild by itself.

use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Bfs, Reversed};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};
use valence_source::FileId;

/// Errors from building or ordering the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Targets depend on each other in a loop.
    #[error("dependency cycle through target '{target}'")]
    Cycle {
        /// One target on the cycle.
        target: String,
    },

    /// Two targets claim to write the same file.
    #[error("{file} is produced by both '{first}' and '{second}'")]
    DuplicateOutput {
        /// The contested file.
        file: FileId,
        /// The target registered first.
        first: String,
        /// The target registered second.
        second: String,
    },

    /// The id was already added.
    #[error("target '{0}' already exists")]
    DuplicateTarget(String),

    /// The id is not in the graph.
    #[error("target '{0}' is not in the dependency graph")]
    UnknownTarget(String),
}

/// Targets and the files flowing between them.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<String, FileId>,
    nodes: HashMap<String, NodeIndex>,
    producers: HashMap<FileId, String>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target together with the files it writes.
    pub fn add_target(
        &mut self,
        id: &str,
        outputs: impl IntoIterator<Item = FileId>,
    ) -> Result<(), GraphError> {
        if self.nodes.contains_key(id) {
            return Err(GraphError::DuplicateTarget(id.to_string()));
        }
        let outputs: Vec<FileId> = outputs.into_iter().collect();
        for file in &outputs {
            if let Some(first) = self.producers.get(file) {
                return Err(GraphError::DuplicateOutput {
                    file: file.clone(),
                    first: first.clone(),
                    second: id.to_string(),
                });
            }
        }
        let index = self.graph.add_node(id.to_string());
        self.nodes.insert(id.to_string(), index);
        for file in outputs {
            self.producers.insert(file, id.to_string());
        }
        Ok(())
    }

    /// Removes a target, its edges and its outputs. Returns whether it existed.
    pub fn remove_target(&mut self, id: &str) -> bool {
        let Some(index) = self.nodes.remove(id) else {
            return false;
        };
        self.graph.remove_node(index);
        self.producers.retain(|_, producer| producer != id);
        true
    }

    /// Adds an edge for every input of `consumer` that some target produces.
    ///
    /// Returns the `(file, producer)` pairs that were linked. Inputs nobody
    /// produces are ordinary source files and are skipped.
    pub fn connect<'a>(
        &mut self,
        consumer: &str,
        inputs: impl IntoIterator<Item = &'a FileId>,
    ) -> Result<Vec<(FileId, String)>, GraphError> {
        let to = self.index(consumer)?;
        let mut linked = Vec::new();
        for file in inputs {
            let Some(producer) = self.producers.get(file) else {
                continue;
            };
            let from = self.index(producer)?;
            self.graph.add_edge(from, to, file.clone());
            linked.push((file.clone(), producer.clone()));
        }
        Ok(linked)
    }

    /// The target that writes `file`.
    pub fn producer_of(&self, file: &FileId) -> Option<&str> {
        self.producers.get(file).map(String::as_str)
    }

    /// Targets `id` reads from directly, sorted.
    pub fn dependencies_of(&self, id: &str) -> Result<Vec<&str>, GraphError> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Targets that read from `id` directly, sorted.
    pub fn dependents_of(&self, id: &str) -> Result<Vec<&str>, GraphError> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Every target `id` transitively depends on, excluding `id` itself.
    pub fn ancestors_of(&self, id: &str) -> Result<BTreeSet<&str>, GraphError> {
        let start = self.index(id)?;
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut found = BTreeSet::new();
        while let Some(index) = bfs.next(reversed) {
            if index != start {
                found.insert(self.graph[index].as_str());
            }
        }
        Ok(found)
    }

    /// All targets, producers before consumers.
    pub fn build_order(&self) -> Result<Vec<String>, GraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|i| self.graph[i].clone()).collect())
            .map_err(|cycle| GraphError::Cycle {
                target: self.graph[cycle.node_id()].clone(),
            })
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn index(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownTarget(id.to_string()))
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Result<Vec<&str>, GraphError> {
        let index = self.index(id)?;
        let names: BTreeSet<&str> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        Ok(names.into_iter().collect())
    }
}
