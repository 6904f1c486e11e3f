//! Run-order scheduling.
//!
//! Produces a total order over the containers of a [`DependencyGraph`]
//! using Kahn's algorithm. Whenever several containers are ready, the one
//! whose template ranks highest in the [`RunOrderPreference`] goes first;
//! remaining ties fall back to declaration order. Link dependencies always
//! win over the preference.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use dockconf_common::error::{CycleKind, DockconfError, Result};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;

/// User-supplied priority ranking over template names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunOrderPreference {
    templates: Vec<String>,
}

impl RunOrderPreference {
    /// Creates a preference from template names, highest priority first.
    #[must_use]
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    /// Rank of `template`, or `None` if it is not listed.
    ///
    /// A template listed more than once keeps its first position.
    #[must_use]
    pub fn rank(&self, template: &str) -> Option<usize> {
        self.templates.iter().position(|t| t == template)
    }

    /// Number of listed templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if no template is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Computes the processing order of every container in `graph`.
///
/// `declaration_order` lists container names as declared; containers
/// missing from it sort after the declared ones in graph order.
///
/// # Errors
///
/// Returns [`DockconfError::Cycle`] naming the containers on link cycles.
/// No partial order is returned.
pub fn order(
    graph: &DependencyGraph,
    preference: Option<&RunOrderPreference>,
    declaration_order: &[String],
) -> Result<Vec<String>> {
    let inner = graph.inner();
    let declared: HashMap<&str, usize> = declaration_order
        .iter()
        .enumerate()
        .map(|(pos, name)| (name.as_str(), pos))
        .collect();

    let priority = |idx: NodeIndex| -> (usize, usize, usize) {
        let Some(node) = graph.node(idx) else {
            return (usize::MAX, usize::MAX, idx.index());
        };
        let rank = preference.map_or(0, |p| p.rank(&node.template).unwrap_or(p.len()));
        let position = declared
            .get(node.name.as_str())
            .copied()
            .unwrap_or(declaration_order.len() + idx.index());
        (rank, position, idx.index())
    };

    let mut pending: HashMap<NodeIndex, usize> = HashMap::with_capacity(inner.node_count());
    let mut ready = BinaryHeap::new();
    for idx in inner.node_indices() {
        let incoming = inner
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .count();
        if incoming == 0 {
            ready.push(Reverse(priority(idx)));
        } else {
            let _ = pending.insert(idx, incoming);
        }
    }

    let mut ordered = Vec::with_capacity(inner.node_count());
    while let Some(Reverse((_, _, raw))) = ready.pop() {
        let idx = NodeIndex::new(raw);
        if let Some(node) = graph.node(idx) {
            ordered.push(node.name.clone());
        }
        for dependent in inner.neighbors_directed(idx, petgraph::Direction::Outgoing) {
            if let Some(remaining) = pending.get_mut(&dependent) {
                *remaining -= 1;
                if *remaining == 0 {
                    let _ = pending.remove(&dependent);
                    ready.push(Reverse(priority(dependent)));
                }
            }
        }
    }

    if !pending.is_empty() {
        return Err(DockconfError::Cycle {
            kind: CycleKind::Link,
            nodes: cycle_members(graph, &priority),
        });
    }

    tracing::info!(containers = ordered.len(), "computed run order");
    Ok(ordered)
}

fn cycle_members<F>(graph: &DependencyGraph, priority: &F) -> Vec<String>
where
    F: Fn(NodeIndex) -> (usize, usize, usize),
{
    let inner = graph.inner();
    let mut members: Vec<NodeIndex> = petgraph::algo::tarjan_scc(inner)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| inner.contains_edge(idx, idx))
        })
        .flatten()
        .collect();
    members.sort_by_key(|&idx| priority(idx).1);
    members
        .into_iter()
        .filter_map(|idx| graph.node(idx).map(|n| n.name.clone()))
        .collect()
}
