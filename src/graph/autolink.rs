//! Numeric adjacency inference.
//!
//! Ids ending in a digit run form implicit sequences: "S-1", "S-2", "S-3".
//! Where the author declared no edge, adjacent values under the same prefix
//! are linked so the flow stays walkable without explicit wiring. Declared
//! dependencies and children always win; inference only bridges silence, and
//! it never reports anything.

use std::collections::HashMap;

use super::TopicGraph;

/// Split a trailing ASCII digit run off an id.
///
/// Leading zeros are insignificant: "S-001", "S-1" and "S-01" all denote
/// ("S-", 1). Ids without a trailing digit run, or whose run does not fit
/// u64, have no numeric identity and are excluded from inference.
pub fn numeric_id(id: &str) -> Option<(&str, u64)> {
    let bytes = id.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == bytes.len() {
        return None;
    }
    let value = id[start..].parse().ok()?;
    Some((&id[..start], value))
}

/// Fill dependency/children gaps by numeric adjacency.
///
/// Mutates the children map, root list and graph-owned node dependencies in
/// place. Runs after explicit edges are resolved and sorted, before cycle
/// detection.
pub(crate) fn auto_link(graph: &mut TopicGraph) {
    let TopicGraph {
        nodes,
        order,
        children,
        roots,
        ..
    } = graph;

    // (prefix, value) -> id over all nodes. First record wins, so collisions
    // like "S-01" vs "S-1" stay deterministic across builds.
    let mut by_value: HashMap<(String, u64), String> = HashMap::new();
    for id in order.iter() {
        if let Some((prefix, value)) = numeric_id(id) {
            by_value
                .entry((prefix.to_string(), value))
                .or_insert_with(|| id.clone());
        }
    }

    // Predecessor pass: a node with no dependency hangs off value - 1.
    for id in order.iter() {
        let Some((prefix, value)) = numeric_id(id) else {
            continue;
        };
        if value <= 1 {
            continue;
        }
        if nodes.get(id).map_or(true, |n| n.dependency.is_some()) {
            continue;
        }
        let Some(pred) = by_value.get(&(prefix.to_string(), value - 1)) else {
            continue;
        };
        if pred == id {
            continue;
        }
        if let Some(node) = nodes.get_mut(id) {
            node.dependency = Some(pred.clone());
        }
        roots.retain(|r| r != id);
        let list = children.entry(pred.clone()).or_default();
        if !list.iter().any(|c| c == id) {
            list.push(id.clone());
            list.sort_unstable();
        }
    }

    // Successor pass: value + 1 becomes a child, unless the successor carries
    // a dependency of its own (declared or just backfilled above).
    for id in order.iter() {
        let Some((prefix, value)) = numeric_id(id) else {
            continue;
        };
        let Some(succ) = by_value.get(&(prefix.to_string(), value + 1)) else {
            continue;
        };
        if succ == id {
            continue;
        }
        if nodes.get(succ.as_str()).map_or(true, |n| n.dependency.is_some()) {
            continue;
        }
        let list = children.entry(id.clone()).or_default();
        if !list.iter().any(|c| c == succ) {
            list.push(succ.clone());
            list.sort_unstable();
        }
    }
}
