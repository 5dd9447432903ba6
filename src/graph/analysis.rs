//! Cycle grouping.
//!
//! The builder's cycle warnings are advisory and only cover loops reachable
//! from a root. This pass mirrors the local edges into petgraph and extracts
//! strongly connected components, which also reveals loops no root can reach
//! (every participant declared a dependency).

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

use super::TopicGraph;

/// A group of mutually reachable nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SccGroup {
    pub id: usize,
    /// Member ids, sorted ascending.
    pub members: Vec<String>,
    /// Single node with an edge to itself.
    pub is_self_referential: bool,
}

/// Collect cycle groups: SCCs of size > 1, plus single nodes with a self-edge.
/// Remote references never participate; they have no local outgoing edges.
pub fn scc_groups(graph: &TopicGraph) -> Vec<SccGroup> {
    let mut mirror: DiGraph<&str, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

    for node in graph.nodes() {
        indices.insert(node.id.as_str(), mirror.add_node(node.id.as_str()));
    }
    for node in graph.nodes() {
        let Some(&from) = indices.get(node.id.as_str()) else {
            continue;
        };
        for child in graph.children(&node.id) {
            if let Some(&to) = indices.get(child.as_str()) {
                mirror.add_edge(from, to, ());
            }
        }
    }

    let mut groups: Vec<(Vec<String>, bool)> = Vec::new();
    for component in kosaraju_scc(&mirror) {
        let self_referential =
            component.len() == 1 && mirror.contains_edge(component[0], component[0]);
        if component.len() < 2 && !self_referential {
            continue;
        }
        let mut members: Vec<String> = component
            .iter()
            .filter_map(|&ix| mirror.node_weight(ix).map(|id| id.to_string()))
            .collect();
        members.sort_unstable();
        groups.push((members, self_referential));
    }

    groups.sort();
    groups
        .into_iter()
        .enumerate()
        .map(|(id, (members, is_self_referential))| SccGroup {
            id,
            members,
            is_self_referential,
        })
        .collect()
}
