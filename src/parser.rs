//! Comment-tag parsing.
//!
//! Single pass over a file's lines. Tags live inside ordinary comments:
//!
//! ```text
//! // @flow checkout
//! // @node PAY-2
//! // @step Charge the stored payment method
//! // @dep PAY-1 [only after fraud review]
//! // @children PAY-3, billing@INV-1
//! // @link code:src/charge.rs
//! ```
//!
//! `@flow` pins the topic for the rest of the file, `@node` opens a record,
//! and the record closes at the next `@node`/`@flow`, at the first non-comment
//! line, or at end of input. Structural problems (no topic, no id, no step)
//! become [`ParseError`]s; the graph layer passes them through untouched and
//! never inspects them.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::model::{Link, LinkKind, NodeRecord, ParseError, ParseErrorKind, SourceLocation};

/// Everything extracted from one source file.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub records: Vec<NodeRecord>,
    pub errors: Vec<ParseError>,
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?://+!?|/\*+|\*+|#+|--|;+|<!--)\s?(.*)$").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@(flow|node|step|dep|children|link)\b\s*(.*)$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Flow,
    Node,
    Step,
    Dep,
    Children,
    Link,
}

struct Pending {
    topic: String,
    id: String,
    step_parts: Vec<String>,
    dependency: Option<String>,
    dependency_note: Option<String>,
    children: Vec<String>,
    links: Vec<Link>,
    location: SourceLocation,
}

/// Parse one file's text. `path` only feeds source locations.
pub fn parse_source(path: &Path, text: &str) -> ParseOutput {
    let mut out = ParseOutput::default();
    let mut topic: Option<String> = None;
    let mut pending: Option<Pending> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line = index as u32 + 1;
        let at = || SourceLocation::new(path, line);

        let Some(comment) = comment_text(raw_line) else {
            // Left the comment block; the topic sticks, the record does not.
            flush(&mut pending, &mut out);
            continue;
        };
        let Some((tag, arg)) = split_tag(comment) else {
            continue;
        };

        match tag {
            Tag::Flow => {
                flush(&mut pending, &mut out);
                if arg.is_empty() {
                    out.errors.push(ParseError {
                        kind: ParseErrorKind::MissingTopic,
                        topic: None,
                        message: "flow tag without a name".to_string(),
                        location: at(),
                    });
                    topic = None;
                } else {
                    topic = Some(arg.to_string());
                }
            }
            Tag::Node => {
                flush(&mut pending, &mut out);
                let Some(current) = topic.clone() else {
                    out.errors.push(ParseError {
                        kind: ParseErrorKind::MissingTopic,
                        topic: None,
                        message: format!("node '{arg}' declared outside any flow"),
                        location: at(),
                    });
                    continue;
                };
                let id = arg.split_whitespace().next().unwrap_or("");
                if id.is_empty() {
                    out.errors.push(ParseError {
                        kind: ParseErrorKind::MissingId,
                        topic: Some(current),
                        message: "node tag without an id".to_string(),
                        location: at(),
                    });
                } else if id.contains('@') {
                    out.errors.push(ParseError {
                        kind: ParseErrorKind::MissingId,
                        topic: Some(current),
                        message: format!(
                            "invalid node id '{id}': '@' is reserved for cross-repository references"
                        ),
                        location: at(),
                    });
                } else {
                    pending = Some(Pending {
                        topic: current,
                        id: id.to_string(),
                        step_parts: Vec::new(),
                        dependency: None,
                        dependency_note: None,
                        children: Vec::new(),
                        links: Vec::new(),
                        location: at(),
                    });
                }
            }
            Tag::Step => match pending.as_mut() {
                Some(p) => {
                    if !arg.is_empty() {
                        p.step_parts.push(arg.to_string());
                    }
                }
                None => stray(&mut out, &topic, "step", at()),
            },
            Tag::Dep => match pending.as_mut() {
                Some(p) => {
                    if !arg.is_empty() {
                        let (dependency, note) = split_dep(arg);
                        p.dependency = Some(dependency);
                        p.dependency_note = note;
                    }
                }
                None => stray(&mut out, &topic, "dep", at()),
            },
            Tag::Children => match pending.as_mut() {
                Some(p) => {
                    p.children.extend(
                        arg.split(',')
                            .map(str::trim)
                            .filter(|c| !c.is_empty())
                            .map(str::to_string),
                    );
                }
                None => stray(&mut out, &topic, "children", at()),
            },
            Tag::Link => match pending.as_mut() {
                Some(p) => {
                    if let Some(link) = split_link(arg) {
                        p.links.push(link);
                    }
                }
                None => stray(&mut out, &topic, "link", at()),
            },
        }
    }

    flush(&mut pending, &mut out);
    out
}

fn stray(out: &mut ParseOutput, topic: &Option<String>, tag: &str, location: SourceLocation) {
    out.errors.push(ParseError {
        kind: ParseErrorKind::MissingId,
        topic: topic.clone(),
        message: format!("{tag} tag before any node block"),
        location,
    });
}

fn flush(pending: &mut Option<Pending>, out: &mut ParseOutput) {
    let Some(p) = pending.take() else { return };
    let step = p.step_parts.join(" ");
    if step.trim().is_empty() {
        out.errors.push(ParseError {
            kind: ParseErrorKind::MissingStep,
            topic: Some(p.topic),
            message: format!("node '{}' has no step text", p.id),
            location: p.location,
        });
        return;
    }
    out.records.push(NodeRecord {
        topic: p.topic,
        id: p.id,
        step,
        dependency: p.dependency,
        dependency_note: p.dependency_note,
        children: if p.children.is_empty() {
            None
        } else {
            Some(p.children)
        },
        links: p.links,
        location: p.location,
    });
}

/// The comment text of a line, leader stripped, or None for non-comment lines.
fn comment_text(line: &str) -> Option<&str> {
    let captures = comment_re().captures(line)?;
    let text = captures.get(1).map_or("", |m| m.as_str());
    let text = text
        .trim_end()
        .trim_end_matches("*/")
        .trim_end_matches("-->")
        .trim_end();
    Some(text)
}

fn split_tag(comment: &str) -> Option<(Tag, &str)> {
    let captures = tag_re().captures(comment.trim_start())?;
    let tag = match captures.get(1).map_or("", |m| m.as_str()) {
        "flow" => Tag::Flow,
        "node" => Tag::Node,
        "step" => Tag::Step,
        "dep" => Tag::Dep,
        "children" => Tag::Children,
        "link" => Tag::Link,
        _ => return None,
    };
    let arg = captures.get(2).map_or("", |m| m.as_str()).trim();
    Some((tag, arg))
}

/// `X [note]` -> ("X", Some("note")); the bracketed note is optional.
fn split_dep(arg: &str) -> (String, Option<String>) {
    let mut parts = arg.splitn(2, char::is_whitespace);
    let dependency = parts.next().unwrap_or("").to_string();
    let rest = parts.next().unwrap_or("").trim();
    let note = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .map(|r| r.trim().to_string());
    (dependency, note)
}

/// `kind:target`; unknown or missing kinds default to doc.
fn split_link(arg: &str) -> Option<Link> {
    if arg.is_empty() {
        return None;
    }
    if let Some((prefix, rest)) = arg.split_once(':') {
        if let Some(kind) = LinkKind::from_tag(prefix) {
            let target = rest.trim();
            if target.is_empty() {
                return None;
            }
            return Some(Link {
                kind,
                target: target.to_string(),
            });
        }
    }
    Some(Link {
        kind: LinkKind::Doc,
        target: arg.to_string(),
    })
}
