//! Classification of dependency and child reference strings.
//!
//! A reference is either a plain id inside the current topic graph or a
//! `<repo>@<id>` pointer into a graph hosted by another repository. Parsing
//! happens once, here; call sites match on the result instead of re-scanning
//! the string.

/// A dependency or child reference, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    /// Plain id, resolvable (or not) against the current topic's node map.
    Local(&'a str),
    /// `<repo>@<id>`: a node owned by another repository's graph. The id is
    /// opaque here and never dereferenced locally.
    Remote { repo: &'a str, id: &'a str },
    /// Empty, or `@` present only at an edge position. Never resolvable.
    Malformed,
}

impl<'a> NodeRef<'a> {
    /// Classify a raw reference string.
    ///
    /// The first `@` splits repo from remote id; both sides must be non-empty.
    /// Node ids themselves can never contain `@` (the parser rejects them), so
    /// a string with `@` only at an edge can match nothing and is malformed.
    pub fn classify(raw: &'a str) -> Self {
        if raw.is_empty() {
            return NodeRef::Malformed;
        }
        match raw.find('@') {
            None => NodeRef::Local(raw),
            Some(at) if at > 0 && at + 1 < raw.len() => NodeRef::Remote {
                repo: &raw[..at],
                id: &raw[at + 1..],
            },
            Some(_) => NodeRef::Malformed,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, NodeRef::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_id_is_local() {
        assert_eq!(NodeRef::classify("REG-1"), NodeRef::Local("REG-1"));
    }

    #[test]
    fn repo_qualified_id_is_remote() {
        assert_eq!(
            NodeRef::classify("billing@INV-1"),
            NodeRef::Remote {
                repo: "billing",
                id: "INV-1"
            }
        );
    }

    #[test]
    fn remote_id_is_opaque_past_the_first_separator() {
        assert_eq!(
            NodeRef::classify("a@b@c"),
            NodeRef::Remote { repo: "a", id: "b@c" }
        );
    }

    #[test]
    fn edge_separators_are_malformed() {
        assert_eq!(NodeRef::classify("@x"), NodeRef::Malformed);
        assert_eq!(NodeRef::classify("x@"), NodeRef::Malformed);
        assert_eq!(NodeRef::classify("@"), NodeRef::Malformed);
        assert_eq!(NodeRef::classify(""), NodeRef::Malformed);
    }
}
