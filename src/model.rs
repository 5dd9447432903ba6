//! Record types produced by the comment-tag parser and consumed by the graph
//! builder.
//!
//! A [`NodeRecord`] is one tagged comment block, lifted out of source text but
//! not yet validated: ids may collide, references may dangle, topics may mix.
//! The graph layer sorts all of that out. [`ParseError`]s are structural
//! problems found during parsing; the graph layer never inspects them, it only
//! filters them by topic and attaches them to the built graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a record or error came from. Diagnostics only; never used for
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path relative to the scanned workspace root.
    pub file: PathBuf,
    /// 1-indexed line number.
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// What a [`Link`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Written documentation (default when the tag carries no kind prefix).
    Doc,
    /// A path into source code.
    Code,
    /// A URL.
    Web,
    /// Another flow, by topic name.
    Flow,
}

impl LinkKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "doc" => Some(Self::Doc),
            "code" => Some(Self::Code),
            "web" => Some(Self::Web),
            "flow" => Some(Self::Flow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Code => "code",
            Self::Web => "web",
            Self::Flow => "flow",
        }
    }
}

/// A typed reference attached to a node. The target is opaque; nothing here
/// checks that it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub kind: LinkKind,
    pub target: String,
}

/// One tagged comment block, as parsed from source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// The flow this node belongs to.
    pub topic: String,
    /// Unique per topic; duplicates are resolved first-wins at build time.
    pub id: String,
    /// Human-readable step text.
    pub step: String,
    /// Declared single parent reference, possibly cross-repository.
    pub dependency: Option<String>,
    /// Bracketed note split off the dependency tag (`@dep X [note]`).
    pub dependency_note: Option<String>,
    /// Declared child references, in tag order, possibly cross-repository.
    pub children: Option<Vec<String>>,
    /// Typed links, in tag order.
    pub links: Vec<Link>,
    pub location: SourceLocation,
}

/// Structural parse error kinds. The graph layer treats these as opaque
/// pass-through data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseErrorKind {
    /// A node tag appeared before any `@flow`, or `@flow` had no name.
    MissingTopic,
    /// A node tag had no usable id, or a tag appeared outside a node block.
    MissingId,
    /// A node block closed without any step text.
    MissingStep,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTopic => "missing-topic",
            Self::MissingId => "missing-id",
            Self::MissingStep => "missing-step",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structural problem found while parsing tagged comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The topic in effect when the error occurred. Errors with no topic
    /// belong to no graph and only surface through the check command.
    pub topic: Option<String>,
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.kind, self.message, self.location)
    }
}
