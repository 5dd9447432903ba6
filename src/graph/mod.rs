//! Per-topic flow graphs.
//!
//! One [`TopicGraph`] per documented flow: node lookup by id, children lookup
//! by parent id, an ordered root list and the structural warnings produced
//! while building. Everything is rebuilt from scratch on every build call;
//! there is no incremental mutation.
//!
//! This module is shared between:
//! - the CLI (tree rendering, checks, search)
//! - the DOT exporter
//!
//! Both consume the same TopicGraph to ensure consistency.

pub mod analysis;
pub(crate) mod autolink;
pub mod builder;
pub mod warnings;

pub use analysis::{scc_groups, SccGroup};
pub use autolink::numeric_id;
pub use builder::{build_graph, build_topics};
pub use warnings::{Warning, WarningKind, Warnings};

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{Link, NodeRecord, ParseError, SourceLocation};

/// A node owned by a built graph.
///
/// Data is copied out of the parser record at build time; the auto-linker
/// backfills `dependency` on this copy only, never on the caller's records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub step: String,
    /// Declared parent reference, or the one inferred by numeric adjacency.
    pub dependency: Option<String>,
    pub dependency_note: Option<String>,
    /// Child references as declared in the source, unvalidated. The resolved
    /// edges live in the graph's children map.
    pub declared_children: Vec<String>,
    pub links: Vec<Link>,
    pub location: SourceLocation,
}

impl FlowNode {
    pub(crate) fn from_record(record: &NodeRecord) -> Self {
        Self {
            id: record.id.clone(),
            step: record.step.clone(),
            dependency: record.dependency.clone(),
            dependency_note: record.dependency_note.clone(),
            declared_children: record.children.clone().unwrap_or_default(),
            links: record.links.clone(),
            location: record.location.clone(),
        }
    }
}

/// A fuzzy-search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub step: String,
    pub score: i64,
}

/// The built graph for one topic.
#[derive(Debug, PartialEq, Serialize)]
pub struct TopicGraph {
    pub topic: String,

    /// Node data indexed by id.
    pub(crate) nodes: HashMap<String, FlowNode>,

    /// Ids in original record order. Keeps collision tie-breaks and iteration
    /// deterministic; not part of the serialized surface.
    #[serde(skip)]
    pub(crate) order: Vec<String>,

    /// Parent id -> sorted child ids (local or remote).
    pub(crate) children: HashMap<String, Vec<String>>,

    /// Sorted ids of nodes with no resolvable local dependency.
    pub(crate) roots: Vec<String>,

    pub(crate) warnings: Warnings,

    /// Upstream parse errors for this topic, passed through untouched.
    pub(crate) parse_errors: Vec<ParseError>,
}

impl TopicGraph {
    // ========== Queries ==========

    /// Get a node by id.
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.get(id)
    }

    /// All nodes, in original record order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Entry points of the flow, sorted ascending.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Sorted child ids of `id`; empty for unknown or childless ids.
    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children(id).is_empty()
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    // ========== Search ==========

    /// Fuzzy-search node ids and step text.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut hits: Vec<SearchHit> = Vec::new();

        for node in self.nodes() {
            let id_score = matcher.fuzzy_match(&node.id, query);
            let step_score = matcher.fuzzy_match(&node.step, query);
            let Some(score) = id_score.max(step_score) else {
                continue;
            };
            hits.push(SearchHit {
                id: node.id.clone(),
                step: node.step.clone(),
                score,
            });
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        hits
    }

    // ========== Export ==========

    /// Render the graph in GraphViz DOT format. Roots are green, nodes that
    /// close a cycle red, remote references dashed.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("digraph \"{}\" {{\n", dot_escape(&self.topic)));
        out.push_str("  rankdir=LR;\n");
        out.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        out.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n\n");

        let cyclic: HashSet<&str> = self
            .warnings
            .of_kind(WarningKind::CycleDetected)
            .map(|w| w.node_id.as_str())
            .collect();

        for node in self.nodes() {
            let fill = if cyclic.contains(node.id.as_str()) {
                "#F44336"
            } else if self.roots.binary_search(&node.id).is_ok() {
                "#4CAF50"
            } else {
                "#90A4AE"
            };
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\\n{}\", fillcolor=\"{}\"];\n",
                dot_id(&node.id),
                dot_escape(&node.id),
                dot_escape(&truncate(&node.step, 48)),
                fill
            ));
        }

        // Remote references get dashed placeholder nodes.
        let mut remote: BTreeSet<&str> = BTreeSet::new();
        for node in self.nodes() {
            for child in self.children(&node.id) {
                if !self.nodes.contains_key(child) {
                    remote.insert(child);
                }
            }
        }
        for target in &remote {
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\", style=\"dashed,rounded\"];\n",
                dot_id(target),
                dot_escape(target)
            ));
        }

        out.push('\n');
        for node in self.nodes() {
            for child in self.children(&node.id) {
                let style = if self.nodes.contains_key(child) {
                    ""
                } else {
                    " [style=dashed]"
                };
                out.push_str(&format!(
                    "  \"{}\" -> \"{}\"{};\n",
                    dot_id(&node.id),
                    dot_id(child),
                    style
                ));
            }
        }

        out.push_str("}\n");
        out
    }
}

fn dot_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn dot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max_chars).collect();
        short.push('…');
        short
    }
}
