//! flowdocs
//!
//! Extracts a lightweight documentation graph from tagged comments scattered
//! across a codebase and turns it into navigable per-topic flows, including
//! references that span separate repositories.
//!
//! ## Features
//!
//! - **Tagged comments**: `@flow` / `@node` / `@step` / `@dep` / `@children` / `@link`
//! - **Deterministic graphs**: first-wins deduplication, sorted roots and child lists
//! - **Numeric auto-linking**: "S-1", "S-2", "S-3" chain up without explicit wiring
//! - **Cross-repository references**: `billing@INV-1`, validated against configured names
//! - **Warnings, not failures**: malformed input degrades to structural warnings
//!
//! ## Pipeline
//!
//! ```text
//! scan_workspace ──> parse_source ──> records ──┬──> build_graph(topic) ──> TopicGraph
//!                                    errors  ───┴──> attached per topic
//! ```
//!
//! Graph construction is pure and synchronous; different topics can be built
//! concurrently from the same record set.

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod parser;
pub mod reference;
pub mod scan;

pub use config::FlowConfig;
pub use error::{FlowError, Result};
pub use graph::{
    build_graph, build_topics, numeric_id, scc_groups, FlowNode, SccGroup, SearchHit, TopicGraph,
    Warning, WarningKind, Warnings,
};
pub use model::{
    Link, LinkKind, NodeRecord, ParseError, ParseErrorKind, SourceLocation,
};
pub use parser::{parse_source, ParseOutput};
pub use reference::NodeRef;
pub use scan::{scan_workspace, ScanConfig, ScanOutput};
