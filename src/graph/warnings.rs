//! Structural warnings attached to a built topic graph.
//!
//! Graph construction never fails: duplicate ids, dangling references and
//! cyclic edges all degrade to a warning here plus a defined structural
//! fallback, and the caller still gets a navigable graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::SourceLocation;

// =============================================================================
// Warning Kind
// =============================================================================

/// What went structurally wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A later record re-used an id already registered in the topic; the first
    /// registration wins.
    DuplicateId,
    /// A dependency or child reference that resolves to nothing known, or
    /// names an unconfigured repository.
    MissingDependency,
    /// An edge closed a loop during traversal. Advisory: no edge is removed.
    CycleDetected,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateId => "duplicate-id",
            Self::MissingDependency => "missing-dependency",
            Self::CycleDetected => "cycle-detected",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Warning
// =============================================================================

/// A single structural warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// The node the warning is about.
    pub node_id: String,
    /// Human-readable explanation.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Warning {
    pub fn new(kind: WarningKind, node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            node_id: node_id.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

// =============================================================================
// Warnings Collection
// =============================================================================

/// Ordered collection of warnings accumulated during one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        self.items.push(warning);
    }

    pub fn all(&self) -> &[Warning] {
        &self.items
    }

    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.items.iter().filter(move |w| w.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl IntoIterator for Warnings {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_match_the_wire_format() {
        assert_eq!(WarningKind::DuplicateId.as_str(), "duplicate-id");
        assert_eq!(WarningKind::MissingDependency.as_str(), "missing-dependency");
        assert_eq!(WarningKind::CycleDetected.as_str(), "cycle-detected");
    }

    #[test]
    fn collection_filters_by_kind() {
        let mut warnings = Warnings::new();
        warnings.push(Warning::new(WarningKind::DuplicateId, "A", "dup"));
        warnings.push(Warning::new(WarningKind::MissingDependency, "B", "ghost"));
        warnings.push(Warning::new(WarningKind::MissingDependency, "C", "ghost"));

        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings.of_kind(WarningKind::MissingDependency).count(), 2);
        assert_eq!(warnings.of_kind(WarningKind::CycleDetected).count(), 0);
    }

    #[test]
    fn display_includes_location_when_present() {
        let warning = Warning::new(WarningKind::DuplicateId, "A", "node id 'A' is already defined")
            .at(SourceLocation::new("src/pay.rs", 12));
        assert_eq!(
            warning.to_string(),
            "[duplicate-id] node id 'A' is already defined (src/pay.rs:12)"
        );
    }
}
