//! Dependency graph management using `petgraph`.
//!
//! Builds a directed graph from the link references of resolved
//! containers. An edge `a -> b` means `b` links to `a`, so `a` must be
//! processed first.

use std::collections::HashMap;

use dockconf_common::constants::NAME_KEY;
use dockconf_common::error::{CycleKind, DockconfError, Result};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::instance::ResolvedContainer;
use crate::links::LinkExtractor;

/// A container node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerNode {
    /// Configuration entry name.
    pub name: String,
    /// Template the entry instantiated.
    pub template: String,
}

/// A dependency graph of containers.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: petgraph::Graph<ContainerNode, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a container node, or returns the existing node of that name.
    pub fn add_container(&mut self, name: impl Into<String>, template: impl Into<String>) -> NodeIndex {
        let name = name.into();
        if let Some(&idx) = self.nodes.get(&name) {
            return idx;
        }
        let idx = self.graph.add_node(ContainerNode {
            name: name.clone(),
            template: template.into(),
        });
        let _ = self.nodes.insert(name, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent` so that a
    /// topological sort yields dependencies first. Repeated edges collapse
    /// into one.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Looks up the node index of a container.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.get(name).copied()
    }

    /// Returns the node stored at `idx`.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&ContainerNode> {
        self.graph.node_weight(idx)
    }

    /// Number of containers in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph holds no containers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Names of the containers `name` directly depends on, in declaration order.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(idx) = self.index_of(name) else {
            return Vec::new();
        };
        let mut deps: Vec<(usize, &str)> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|edge| {
                let source = edge.source();
                self.node(source).map(|n| (source.index(), n.name.as_str()))
            })
            .collect();
        deps.sort_unstable();
        deps.into_iter().map(|(_, n)| n).collect()
    }

    /// All edges as `(dependency, dependent)` name pairs.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let from = self.node(edge.source())?;
                let to = self.node(edge.target())?;
                Some((from.name.as_str(), to.name.as_str()))
            })
            .collect()
    }

    pub(crate) const fn inner(&self) -> &petgraph::Graph<ContainerNode, ()> {
        &self.graph
    }
}

/// Builds the dependency graph from resolved containers.
///
/// Containers are added in slice order, which becomes the graph's node
/// order. A link may name a configuration entry or the `name` option of a
/// resolved container.
///
/// # Errors
///
/// Returns [`DockconfError::DanglingLink`] if a link names no container in
/// the composition and [`DockconfError::Cycle`] if a container links to
/// itself.
pub fn build_graph(
    containers: &[ResolvedContainer],
    extractor: &dyn LinkExtractor,
) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    for container in containers {
        let _ = graph.add_container(&container.name, &container.template);
    }

    let mut aliases: HashMap<&str, &str> = HashMap::new();
    for container in containers {
        if let Some(alias) = container.options.get(NAME_KEY).and_then(|v| v.as_str()) {
            let _ = aliases.entry(alias).or_insert(container.name.as_str());
        }
    }

    for container in containers {
        let Some(dependent) = graph.index_of(&container.name) else {
            continue;
        };
        for link in extractor.linked_names(&container.options) {
            let target = if graph.index_of(&link).is_some() {
                link.as_str()
            } else if let Some(&entry) = aliases.get(link.as_str()) {
                entry
            } else {
                return Err(DockconfError::DanglingLink {
                    container: container.name.clone(),
                    link,
                });
            };

            if target == container.name {
                return Err(DockconfError::Cycle {
                    kind: CycleKind::Link,
                    nodes: vec![container.name.clone(), container.name.clone()],
                });
            }
            if let Some(dependency) = graph.index_of(target) {
                tracing::debug!(container = %container.name, dependency = target, "link dependency");
                graph.add_dependency(dependent, dependency);
            }
        }
    }

    Ok(graph)
}
